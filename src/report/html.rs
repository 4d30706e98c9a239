use super::assets::OFFSETS_IMAGE;
use super::charts::{phase_position, rpf_phase, total_phase, triplet};
use super::group_thousands;
use crate::core::model::{OffsetSource, OffsetTable, ReportMetadata};
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

pub const LOGO: &str = "BIOBIX_logo.png";

const NAV: [(&str, &str); 8] = [
    ("section1", "Analysis information"),
    ("section2", ""),
    ("section3", "Gene distributions"),
    ("section4", "Metagenic classification"),
    ("section5", "Total phase distribution"),
    ("section6", "RPF phase distribution"),
    ("section7", "Phase - relative position distribution"),
    ("section8", "Triplet identity plots"),
];

pub fn write_report(path: &Path, meta: &ReportMetadata, offsets: &OffsetTable) -> Result<()> {
    let html = build(meta, offsets)?;
    fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn offsets_title(source: OffsetSource) -> &'static str {
    match source {
        OffsetSource::Plastid => "Plastid offset analysis",
        _ => "Offsets overview",
    }
}

pub(crate) fn build(meta: &ReportMetadata, offsets: &OffsetTable) -> Result<String> {
    let mut html = String::with_capacity(32 * 1024);
    let run_name = escape(&meta.exp_name);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<title>Mapping QC Report {}</title>", run_name)?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"description\" content=\"Overview HTML of all mappingQC results\"/>"
    )?;
    write_style(&mut html)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    writeln!(html, "<div id=\"header\">")?;
    writeln!(
        html,
        "<h1><span id=\"mappingqc\">Mapping QC</span><span id=\"run_name\">{}</span></h1>",
        run_name
    )?;
    writeln!(html, "<img src=\"{}\" alt=\"biobix_logo\" id=\"biobix_logo\">", LOGO)?;
    writeln!(html, "</div>")?;

    writeln!(html, "<nav id=\"navigator\">")?;
    writeln!(html, "<ul>")?;
    for (anchor, title) in NAV {
        let title = if anchor == "section2" {
            offsets_title(meta.offset_source)
        } else {
            title
        };
        writeln!(html, "<li><a href=\"#{}\">{}</a></li>", anchor, title)?;
    }
    writeln!(html, "</ul>")?;
    writeln!(html, "</nav>")?;

    writeln!(html, "<div id=\"content\">")?;
    section(&mut html, "section1", "info", "Analysis information")?;
    write_info_table(&mut html, meta)?;

    section(&mut html, "section2", "plastid", offsets_title(meta.offset_source))?;
    write_offset_table(&mut html, offsets)?;
    if meta.offset_source == OffsetSource::Plastid {
        writeln!(html, "<div class=\"img\" id=\"plastid_img\">")?;
        writeln!(
            html,
            "<img src=\"{}\" alt=\"Plastid analysis\" id=\"plastid_plot\">",
            OFFSETS_IMAGE
        )?;
        writeln!(html, "</div>")?;
    }

    section(&mut html, "section3", "gene_distributions", "Gene distributions")?;
    figure(&mut html, "rankedgenes.png", "Ranked genes", "ranked_genes")?;
    figure(&mut html, "cumulative.png", "Cumulative genes", "cumulative")?;
    figure(&mut html, "density.png", "Genes density", "genes_density")?;

    section(
        &mut html,
        "section4",
        "metagenic_classification",
        "Metagenic classification",
    )?;
    figure(
        &mut html,
        "annotation_coding.png",
        "Metagenic classification coding",
        "annotation_coding",
    )?;
    figure(
        &mut html,
        "annotation_noncoding.png",
        "Noncoding classification",
        "annotation_noncoding",
    )?;

    section(&mut html, "section5", "tot_phase", "Total phase distribution")?;
    figure(&mut html, total_phase::FILE_NAME, "total phase plot", "tot_phase_img")?;

    section(&mut html, "section6", "phase_rpf_distr", "RPF phase distribution")?;
    figure(&mut html, rpf_phase::FILE_NAME, "rpf phase plot", "rpf_phase_img")?;

    section(
        &mut html,
        "section7",
        "phase_relpos_distr",
        "Phase - relative position distribution",
    )?;
    figure(
        &mut html,
        phase_position::FILE_NAME,
        "phase relpos distr",
        "phase_relpos_distr_img",
    )?;

    section(&mut html, "section8", "triplet_identity", "Triplet identity plots")?;
    figure(&mut html, triplet::FILE_NAME, "triplet identity plots", "triplet_id_img")?;
    writeln!(html, "</div>")?;

    writeln!(html, "<div id=\"footer\">")?;
    writeln!(
        html,
        "<p id=\"footer_content\">Generated with mQC - BioBix lab Ghent (Belgium) - Steven Verbruggen</p>"
    )?;
    writeln!(html, "</div>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;
    Ok(html)
}

fn write_style(html: &mut String) -> Result<()> {
    writeln!(html, "<style>")?;
    writeln!(
        html,
        "*{{box-sizing:border-box;font-family:'Helvetica Neue',Helvetica,Arial,sans-serif;}}"
    )?;
    writeln!(html, "body{{margin:0;}}")?;
    writeln!(
        html,
        "#header{{position:fixed;top:0;left:0;right:0;height:2.7cm;padding:10px 25px;background:grey;color:#fff;z-index:2;}}"
    )?;
    writeln!(html, "#mappingqc{{font-size:44px;}}")?;
    writeln!(html, "#run_name{{padding-left:43px;}}")?;
    writeln!(
        html,
        "#biobix_logo{{position:absolute;right:200px;top:20px;height:60%;}}"
    )?;
    writeln!(
        html,
        "nav{{position:fixed;top:2.7cm;bottom:0.7cm;width:17%;padding:15px;overflow:auto;border-right:ridge lightgrey;background:#fff;z-index:1;}}"
    )?;
    writeln!(html, "nav ul{{list-style-type:none;margin:0;padding:5px;}}")?;
    writeln!(
        html,
        "nav li{{padding:8px;margin-bottom:8px;background:#33b5e5;color:#fff;}}"
    )?;
    writeln!(html, "nav li:hover{{background:#0099cc;}}")?;
    writeln!(html, "a{{color:inherit;text-decoration:none;}}")?;
    writeln!(
        html,
        "#content{{margin:3.2cm 0 1.2cm 19%;padding-right:20px;}}"
    )?;
    writeln!(
        html,
        ".anchor{{display:block;height:3cm;margin-top:-3cm;visibility:hidden;}}"
    )?;
    writeln!(
        html,
        "th,td{{border:0;padding:5px;}}th{{background:#33b5e5;color:#fff;}}td{{background:#f2f2f2;}}"
    )?;
    writeln!(html, "img{{max-width:98%;height:auto;}}")?;
    writeln!(
        html,
        "#ranked_genes,#cumulative,#genes_density,#annotation_coding,#annotation_noncoding{{width:20cm;}}"
    )?;
    writeln!(html, "#offset_table{{float:left;margin-right:120px;}}")?;
    writeln!(html, "#plastid_img{{float:left;max-width:600px;}}")?;
    writeln!(html, "#section3{{clear:left;}}")?;
    writeln!(
        html,
        "#footer{{position:fixed;bottom:0;left:0;right:0;height:0.7cm;padding-left:30px;background:grey;color:#fff;z-index:2;}}"
    )?;
    writeln!(html, "#footer_content{{margin:0.15cm 0;}}")?;
    writeln!(html, "</style>")?;
    Ok(())
}

fn section(html: &mut String, anchor: &str, id: &str, title: &str) -> Result<()> {
    writeln!(html, "<span class=\"anchor\" id=\"{}\"></span>", anchor)?;
    writeln!(html, "<h2 id=\"{}\">{}</h2>", id, title)?;
    Ok(())
}

fn figure(html: &mut String, src: &str, alt: &str, id: &str) -> Result<()> {
    writeln!(
        html,
        "<div class=\"img\"><img src=\"{}\" alt=\"{}\" id=\"{}\"></div>",
        src, alt, id
    )?;
    Ok(())
}

fn write_info_table(html: &mut String, meta: &ReportMetadata) -> Result<()> {
    let total = meta
        .total_alignments
        .map(group_thousands)
        .unwrap_or_else(|| "NA".to_string());
    let date = meta.generated.format("%A %d %b %Y").to_string();
    let time = meta.generated.format("%H:%M:%S").to_string();
    let rows: [(&str, &str); 9] = [
        ("Species", meta.species.as_str()),
        ("Input sam/bam file", meta.input_samfile.as_str()),
        ("Ensembl version", meta.ensembl_version.as_str()),
        ("Ensembl database", meta.ensembl_db.as_str()),
        ("Selected offset source", meta.offset_source.as_str()),
        ("Used only unique alignments", meta.unique.as_str()),
        ("Total mapped genomic sequences", total.as_str()),
        ("Analysis date", date.as_str()),
        ("Analysis time", time.as_str()),
    ];

    writeln!(html, "<table id=\"analysis_info_table\">")?;
    writeln!(html, "<tr><th>Feature</th><th>Value</th></tr>")?;
    for (k, v) in rows {
        writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", k, escape(v))?;
    }
    writeln!(html, "</table>")?;
    Ok(())
}

fn write_offset_table(html: &mut String, offsets: &OffsetTable) -> Result<()> {
    writeln!(html, "<table id=\"offset_table\">")?;
    writeln!(html, "<tr><th>RPF length</th><th>Offset</th></tr>")?;
    for e in offsets.entries() {
        writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", e.length, e.offset)?;
    }
    writeln!(html, "</table>")?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::YesNo;
    use chrono::TimeZone;

    fn meta(source: OffsetSource, total: Option<u64>) -> ReportMetadata {
        ReportMetadata {
            exp_name: "liver <run 1>".to_string(),
            species: "mouse".to_string(),
            input_samfile: "STAR/fastq1/untreat.sam".to_string(),
            ensembl_db: "ENS_mmu_82.db".to_string(),
            ensembl_version: "82".to_string(),
            offset_source: source,
            unique: YesNo::Yes,
            total_alignments: total,
            generated: chrono::Local
                .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
                .single()
                .unwrap(),
        }
    }

    fn offsets() -> OffsetTable {
        OffsetTable::from_observed(&[(28, 12), (30, 13)]).unwrap().0
    }

    #[test]
    fn plastid_report_embeds_offset_image() {
        let html = build(&meta(OffsetSource::Plastid, Some(1_234_567)), &offsets()).unwrap();
        assert!(html.contains("<h2 id=\"plastid\">Plastid offset analysis</h2>"));
        assert!(html.contains("src=\"offsets.png\""));
        assert!(html.contains("<td>1 234 567</td>"));
        assert!(html.contains("<tr><td>29</td><td>12</td></tr>"));
    }

    #[test]
    fn standard_report_has_table_only() {
        let html = build(&meta(OffsetSource::Standard, None), &offsets()).unwrap();
        assert!(html.contains("<h2 id=\"plastid\">Offsets overview</h2>"));
        assert!(html.contains("<a href=\"#section2\">Offsets overview</a>"));
        assert!(!html.contains("offsets.png"));
        assert!(html.contains("<td>NA</td>"));
        assert!(html.contains("<td>standard</td>"));
    }

    #[test]
    fn fixed_structure() {
        let html = build(&meta(OffsetSource::FromFile, Some(5)), &offsets()).unwrap();
        for i in 1..=8 {
            assert!(html.contains(&format!("href=\"#section{}\"", i)));
            assert!(html.contains(&format!("id=\"section{}\"", i)));
        }
        for img in [
            "BIOBIX_logo.png",
            "rankedgenes.png",
            "cumulative.png",
            "density.png",
            "annotation_coding.png",
            "annotation_noncoding.png",
            "tot_phase.png",
            "rpf_phase.png",
            "phase_relpos_distr.png",
            "triplet_id.png",
        ] {
            assert!(html.contains(&format!("src=\"{}\"", img)), "{img}");
        }
        assert!(!html.contains("<script"));
        assert!(html.contains("<td>Tuesday 05 Mar 2024</td>"));
        assert!(html.contains("<td>14:07:09</td>"));
    }

    #[test]
    fn user_strings_are_escaped() {
        let html = build(&meta(OffsetSource::Standard, None), &offsets()).unwrap();
        assert!(html.contains("<title>Mapping QC Report liver &lt;run 1&gt;</title>"));
        assert!(!html.contains("<run 1>"));
    }
}

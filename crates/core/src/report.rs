use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Default value for a section that never matched or matched empty.
pub const SECTION_SENTINEL: &str = "Could not parse this section from the analysis.";

/// One expected section of a generative response: a field name plus a
/// line-anchored, case-insensitive heading pattern. The pattern table is
/// configuration, decoupled from any particular prompt wording.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub name: String,
    heading: Regex,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let heading = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()?;
        Ok(Self {
            name: name.into(),
            heading,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportField {
    pub name: String,
    pub text: String,
    /// False when the field holds the sentinel instead of extracted text.
    pub parsed: bool,
}

/// Parsed sections of one generative response, in declaration order of
/// the section table that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub fields: Vec<ReportField>,
}

impl Report {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.text.as_str())
    }
}

struct Located {
    spec_index: usize,
    heading_start: usize,
    content_start: usize,
}

/// Extracts one trimmed body per section spec from `raw_text`.
///
/// Only the first match of each heading counts. Found headings are
/// processed in order of appearance, not declaration order, so each
/// section's span runs to the next heading the model actually emitted.
/// Missing or empty sections degrade to the sentinel; parsing never fails.
pub fn parse_sections(raw_text: &str, specs: &[SectionSpec]) -> Report {
    let mut located: Vec<Located> = specs
        .iter()
        .enumerate()
        .filter_map(|(spec_index, spec)| {
            spec.heading.find(raw_text).map(|found| Located {
                spec_index,
                heading_start: found.start(),
                content_start: raw_text[found.end()..]
                    .find('\n')
                    .map(|offset| found.end() + offset + 1)
                    .unwrap_or(found.end()),
            })
        })
        .collect();

    located.sort_by_key(|section| section.heading_start);

    let mut extracted: Vec<Option<String>> = vec![None; specs.len()];
    for (position, section) in located.iter().enumerate() {
        let span_end = located
            .get(position + 1)
            .map(|next| next.heading_start)
            .unwrap_or(raw_text.len());
        if section.content_start >= span_end {
            continue;
        }
        let body = raw_text[section.content_start..span_end].trim();
        if !body.is_empty() {
            extracted[section.spec_index] = Some(body.to_string());
        }
    }

    Report {
        fields: specs
            .iter()
            .zip(extracted)
            .map(|(spec, text)| ReportField {
                name: spec.name.clone(),
                parsed: text.is_some(),
                text: text.unwrap_or_else(|| SECTION_SENTINEL.to_string()),
            })
            .collect(),
    }
}

/// The seven headings a market-analysis response is asked to emit. One
/// tolerant pattern per section: an optional leading number and dot, then
/// the heading text at the start of a line.
pub fn market_section_specs() -> Result<Vec<SectionSpec>, regex::Error> {
    Ok(vec![
        SectionSpec::new("common_stack", r"^\s*\d*\.?\s*Common Tech Stack:")?,
        SectionSpec::new("project_ideas", r"^\s*\d*\.?\s*Suggested Project Ideas:")?,
        SectionSpec::new(
            "job_prioritization",
            r"^\s*\d*\.?\s*Job Prioritization\s*\(based on (?:your resume|query)[^)\n]*\):",
        )?,
        SectionSpec::new("experience_summary", r"^\s*\d*\.?\s*Experience Level Summary:")?,
        SectionSpec::new("market_insights", r"^\s*\d*\.?\s*Overall Market Insights:")?,
        SectionSpec::new(
            "detailed_trends",
            r"^\s*\d*\.?\s*Detailed Market Trends & Insights:",
        )?,
        SectionSpec::new(
            "competitive_landscape",
            r"^\s*\d*\.?\s*Competitive Landscape Analysis\s*\(Resume vs\. Market\):",
        )?,
    ])
}

/// Typed view over the market-analysis sections.
#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub common_stack: String,
    pub project_ideas: String,
    pub job_prioritization: String,
    pub experience_summary: String,
    pub market_insights: String,
    pub detailed_trends: String,
    pub competitive_landscape: String,
}

impl MarketReport {
    pub fn from_analysis(raw_text: &str) -> Result<Self, regex::Error> {
        let report = parse_sections(raw_text, &market_section_specs()?);
        let field = |name: &str| {
            report
                .get(name)
                .unwrap_or(SECTION_SENTINEL)
                .to_string()
        };
        Ok(Self {
            common_stack: field("common_stack"),
            project_ideas: field("project_ideas"),
            job_prioritization: field("job_prioritization"),
            experience_summary: field("experience_summary"),
            market_insights: field("market_insights"),
            detailed_trends: field("detailed_trends"),
            competitive_landscape: field("competitive_landscape"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(entries: &[(&str, &str)]) -> Vec<SectionSpec> {
        entries
            .iter()
            .map(|(name, pattern)| SectionSpec::new(*name, pattern).unwrap())
            .collect()
    }

    #[test]
    fn sections_parse_regardless_of_declaration_order() {
        let raw_text = "4. Experience:\nEXP_BODY\n1. Stack:\nSTACK_BODY\n2. Projects:\nPROJ_BODY";
        let specs = specs(&[
            ("stack", r"^\s*\d*\.?\s*Stack:"),
            ("projects", r"^\s*\d*\.?\s*Projects:"),
            ("experience", r"^\s*\d*\.?\s*Experience:"),
        ]);

        let report = parse_sections(raw_text, &specs);

        assert_eq!(report.get("stack"), Some("STACK_BODY"));
        assert_eq!(report.get("projects"), Some("PROJ_BODY"));
        assert_eq!(report.get("experience"), Some("EXP_BODY"));
        // Declaration order is kept in the output.
        assert_eq!(report.fields[0].name, "stack");
        assert_eq!(report.fields[2].name, "experience");
    }

    #[test]
    fn missing_section_keeps_the_sentinel() {
        let raw_text = "1. Stack:\nSTACK_BODY";
        let specs = specs(&[
            ("stack", r"^\s*\d*\.?\s*Stack:"),
            ("projects", r"^\s*\d*\.?\s*Projects:"),
        ]);

        let report = parse_sections(raw_text, &specs);

        assert_eq!(report.get("stack"), Some("STACK_BODY"));
        assert_eq!(report.get("projects"), Some(SECTION_SENTINEL));
        assert!(!report.fields[1].parsed);
    }

    #[test]
    fn empty_section_body_keeps_the_sentinel() {
        let raw_text = "1. Stack:\n   \n2. Projects:\nPROJ_BODY";
        let specs = specs(&[
            ("stack", r"^\s*\d*\.?\s*Stack:"),
            ("projects", r"^\s*\d*\.?\s*Projects:"),
        ]);

        let report = parse_sections(raw_text, &specs);

        assert_eq!(report.get("stack"), Some(SECTION_SENTINEL));
        assert_eq!(report.get("projects"), Some("PROJ_BODY"));
    }

    #[test]
    fn only_the_first_heading_occurrence_counts() {
        let raw_text = "1. Stack:\nFIRST_BODY\n1. Stack:\nSECOND_BODY";
        let specs = specs(&[("stack", r"^\s*\d*\.?\s*Stack:")]);

        let report = parse_sections(raw_text, &specs);

        // The span runs to end-of-text; the echoed heading is part of it.
        let body = report.get("stack").unwrap();
        assert!(body.starts_with("FIRST_BODY"));
    }

    #[test]
    fn headings_match_case_insensitively() {
        let raw_text = "1. STACK:\nSTACK_BODY";
        let specs = specs(&[("stack", r"^\s*\d*\.?\s*Stack:")]);
        assert_eq!(parse_sections(raw_text, &specs).get("stack"), Some("STACK_BODY"));
    }

    #[test]
    fn market_report_extracts_all_seven_fields() {
        let raw_text = "\
1. Common Tech Stack:\nSTACK\n\n\
2. Suggested Project Ideas:\nPROJECTS\n\n\
3. Job Prioritization (based on query & potential):\nPRIORITY\n\n\
4. Experience Level Summary:\nEXPERIENCE\n\n\
5. Overall Market Insights:\nINSIGHTS\n\n\
6. Detailed Market Trends & Insights:\nTRENDS\n\n\
7. Competitive Landscape Analysis (Resume vs. Market):\nLANDSCAPE\n";

        let report = MarketReport::from_analysis(raw_text).unwrap();

        assert_eq!(report.common_stack, "STACK");
        assert_eq!(report.project_ideas, "PROJECTS");
        assert_eq!(report.job_prioritization, "PRIORITY");
        assert_eq!(report.experience_summary, "EXPERIENCE");
        assert_eq!(report.market_insights, "INSIGHTS");
        assert_eq!(report.detailed_trends, "TRENDS");
        assert_eq!(report.competitive_landscape, "LANDSCAPE");
    }

    #[test]
    fn resume_variant_of_the_prioritization_heading_matches() {
        let raw_text = "3. Job Prioritization (based on your resume & potential):\nPRIORITY";
        let report = MarketReport::from_analysis(raw_text).unwrap();
        assert_eq!(report.job_prioritization, "PRIORITY");
    }

    #[test]
    fn unnumbered_headings_still_match() {
        let raw_text = "Overall Market Insights:\nINSIGHTS";
        let report = MarketReport::from_analysis(raw_text).unwrap();
        assert_eq!(report.market_insights, "INSIGHTS");
    }
}

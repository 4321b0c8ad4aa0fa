//! Reporting sink: renders dependency reports as text lines or JSON

use serde::Serialize;

use crate::scan::DependencyReport;
use crate::version::resolver::ResolutionOutcome;

/// Counts per outcome, printed after the text report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub found: usize,
    pub no_supported_version: usize,
    pub not_applicable: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_reports(reports: &[DependencyReport]) -> Self {
        reports
            .iter()
            .fold(Summary::default(), |mut summary, report| {
                match &report.outcome {
                    Ok(ResolutionOutcome::FoundVersion(_)) => summary.found += 1,
                    Ok(ResolutionOutcome::NoSupportedVersion) => summary.no_supported_version += 1,
                    Ok(ResolutionOutcome::NotApplicable) => summary.not_applicable += 1,
                    Err(_) => summary.errors += 1,
                }
                summary
            })
    }
}

/// One line per dependency
///
/// - `name : ^1.0.0 ~> 1.1.0` - found, relative to the declared range
/// - `name : 1.1.0` - found, no declared range
/// - `name : no supported version`
/// - `name : not applicable`
/// - `name : error: ...`
pub fn render_line(report: &DependencyReport) -> String {
    let name = &report.name;

    match &report.outcome {
        Ok(ResolutionOutcome::FoundVersion(version)) => match &report.declared {
            Some(declared) if report.floor.as_ref() == Some(version) => {
                format!("{name} : {declared} ~> {version} (declared range already supported)")
            }
            Some(declared) => format!("{name} : {declared} ~> {version}"),
            None => format!("{name} : {version}"),
        },
        Ok(ResolutionOutcome::NoSupportedVersion) => format!("{name} : no supported version"),
        Ok(ResolutionOutcome::NotApplicable) => format!("{name} : not applicable"),
        Err(e) => format!("{name} : error: {e}"),
    }
}

pub fn render_text(reports: &[DependencyReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&render_line(report));
        out.push('\n');
    }

    let summary = Summary::from_reports(reports);
    out.push_str(&format!(
        "\n{} found, {} unsupported, {} not applicable, {} failed\n",
        summary.found, summary.no_supported_version, summary.not_applicable, summary.errors
    ));
    out
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Found,
    NoSupportedVersion,
    NotApplicable,
    Error,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    name: &'a str,
    declared: Option<&'a str>,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a DependencyReport> for JsonReport<'a> {
    fn from(report: &'a DependencyReport) -> Self {
        let (status, version, error) = match &report.outcome {
            Ok(ResolutionOutcome::FoundVersion(version)) => {
                (Status::Found, Some(version.to_string()), None)
            }
            Ok(ResolutionOutcome::NoSupportedVersion) => (Status::NoSupportedVersion, None, None),
            Ok(ResolutionOutcome::NotApplicable) => (Status::NotApplicable, None, None),
            Err(e) => (Status::Error, None, Some(e.to_string())),
        };

        Self {
            name: &report.name,
            declared: report.declared.as_deref(),
            status,
            version,
            error,
        }
    }
}

pub fn render_json(reports: &[DependencyReport]) -> Result<String, serde_json::Error> {
    let entries: Vec<JsonReport<'_>> = reports.iter().map(JsonReport::from).collect();
    serde_json::to_string_pretty(&entries)
}

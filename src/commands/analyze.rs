use crate::cli;
use crate::config::{self, EvalmapConfig};
use crate::io::{create_writer, read_export};
use crate::report::{analyze_json, AgreementMetrics};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct AnalyzeConfig {
    pub input: PathBuf,
    pub format: cli::OutputFormat,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn handle_analyze(options: AnalyzeConfig) -> Result<()> {
    let config = resolve_config(&options)?;
    let metrics = run_analysis(&options.input, &config)?;
    write_report(&metrics, options.format, options.output.as_ref())
}

fn resolve_config(options: &AnalyzeConfig) -> Result<EvalmapConfig> {
    match &options.config {
        Some(path) => config::load_config_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(config::load_config()),
    }
}

/// Read, validate and analyze one input file
pub fn run_analysis(input: &Path, config: &EvalmapConfig) -> Result<AgreementMetrics> {
    let value = read_export(input)?;
    let metrics = analyze_json(&value, config)
        .with_context(|| format!("Invalid evaluation data in {}", input.display()))?;
    Ok(metrics)
}

fn write_report(
    metrics: &AgreementMetrics,
    format: cli::OutputFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            if format == cli::OutputFormat::Terminal {
                colored::control::set_override(false);
            }
            create_writer(format.into(), std::io::BufWriter::new(file)).write_results(metrics)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            create_writer(format.into(), std::io::stdout().lock()).write_results(metrics)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    const INPUT: &str = indoc! {r#"
        [
          {
            "doi": "10.1/a",
            "userEvaluations": [
              { "userInfo": { "firstName": "A" }, "evaluationMetrics": { "overallScore": 0.9 } },
              { "userInfo": { "firstName": "B" }, "evaluationMetrics": { "overallScore": 0.8 } }
            ]
          }
        ]
    "#};

    #[test]
    fn test_analyze_writes_json_report() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.json");
        let output = dir.path().join("report.json");
        fs::write(&input, INPUT).unwrap();

        handle_analyze(AnalyzeConfig {
            input,
            format: cli::OutputFormat::Json,
            output: Some(output.clone()),
            config: None,
        })
        .unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(report["overallStats"]["totalEvaluations"], 2);
        assert_eq!(report["analysisMode"], "cross-paper");
    }

    #[test]
    fn test_invalid_shape_is_reported() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.json");
        fs::write(&input, r#"{ "papers": [ { "userEvaluations": 3 } ] }"#).unwrap();
        let err = run_analysis(&input, &EvalmapConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("papers[0].userEvaluations must be an array"));
    }

    #[test]
    fn test_missing_input_file() {
        let err = run_analysis(&PathBuf::from("/nonexistent/evalmap.json"), &EvalmapConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}

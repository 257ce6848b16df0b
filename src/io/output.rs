use crate::agreement::{FleissKappa, GroupAgreement};
use crate::report::AgreementMetrics;
use colored::*;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_results(&mut self, results: &AgreementMetrics) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_results(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(results)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

/// `0.823` style, `n/a` for missing values
fn fmt_score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

fn fmt_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

fn kappa_summary(kappa: &FleissKappa) -> String {
    match kappa.kappa {
        Some(value) => format!("{value:.3} ({})", kappa.interpretation),
        None => kappa.interpretation.clone(),
    }
}

fn group_summary(group: &GroupAgreement) -> String {
    format!(
        "{} ({} evaluators, {} papers)",
        fmt_score(group.agreement),
        group.evaluators,
        group.qualifying_papers
    )
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_results(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        self.write_header(results)?;
        self.write_summary(results)?;
        self.write_kappa(results)?;
        self.write_tiers(results)?;
        self.write_distribution(results)?;
        self.write_papers(results)?;
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        writeln!(self.writer, "# Evaluation Agreement Report")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Analysis mode: `{}`", results.analysis_mode)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        let stats = &results.overall_stats;
        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        self.write_row("Sessions", &stats.total_papers.to_string())?;
        self.write_row("Unique papers", &stats.unique_papers.to_string())?;
        self.write_row(
            "Papers with 2+ evaluators",
            &stats.papers_with_multiple_evaluators.to_string(),
        )?;
        self.write_row("Evaluations", &stats.total_evaluations.to_string())?;
        self.write_row("Evaluators", &stats.unique_evaluators.to_string())?;
        self.write_row(
            "Evaluations per paper",
            &stats
                .average_evaluations_per_paper
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}")),
        )?;
        self.write_row("Mean overall score", &fmt_score(stats.mean_overall_score))?;
        self.write_row(
            "Variance agreement",
            &fmt_score(results.variance_agreement.overall),
        )?;
        self.write_row(
            "Cross-paper consistency",
            &results.cross_paper_consistency.interpretation,
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_row(&mut self, metric: &str, value: &str) -> anyhow::Result<()> {
        writeln!(self.writer, "| {metric} | {value} |")?;
        Ok(())
    }

    fn write_kappa(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        writeln!(self.writer, "## Fleiss' Kappa")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Overall: {}",
            kappa_summary(&results.fleiss_kappa)
        )?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| Component | Kappa | Interpretation | Papers | Variance agreement |"
        )?;
        writeln!(
            self.writer,
            "|-----------|-------|----------------|--------|--------------------|"
        )?;
        for (component, kappa) in &results.component_kappa {
            let variance = results
                .variance_agreement
                .by_component
                .get(component)
                .copied()
                .flatten();
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} |",
                component.display_name(),
                fmt_score(kappa.kappa),
                kappa.interpretation,
                kappa.n,
                fmt_score(variance)
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_tiers(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        writeln!(self.writer, "## Expertise Agreement")?;
        writeln!(self.writer)?;
        for (tier, group) in &results.expertise_agreement.within_tier {
            writeln!(self.writer, "- {}: {}", tier, group_summary(group))?;
        }
        let cross = &results.expertise_agreement.cross_tier;
        writeln!(
            self.writer,
            "- Expert vs Junior: {} ({} papers)",
            fmt_score(cross.agreement),
            cross.papers_compared
        )?;
        writeln!(
            self.writer,
            "- With ORKG experience: {}",
            group_summary(&results.orkg_agreement.with_orkg)
        )?;
        writeln!(
            self.writer,
            "- Without ORKG experience: {}",
            group_summary(&results.orkg_agreement.without_orkg)
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_distribution(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        let distribution = &results.rating_distribution;
        writeln!(self.writer, "## Rating Distribution")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Range | Count | Share |")?;
        writeln!(self.writer, "|-------|-------|-------|")?;
        for bin in &distribution.bins {
            writeln!(
                self.writer,
                "| {} | {} | {:.1}% |",
                bin.range, bin.count, bin.percentage
            )?;
        }
        writeln!(self.writer)?;
        let stats = &distribution.stats;
        writeln!(
            self.writer,
            "Mean {}, std dev {}, skewness {}, excess kurtosis {}",
            fmt_score(stats.mean),
            fmt_score(stats.std_dev),
            fmt_score(stats.skewness),
            fmt_score(stats.kurtosis)
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_papers(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        let papers = &results.paper_analysis;
        if papers.disagreement.is_empty() && papers.low.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## Papers Needing Review")?;
        writeln!(self.writer)?;
        for paper in papers.disagreement.iter().chain(&papers.low) {
            writeln!(
                self.writer,
                "- [ ] `{}`: {} consensus, variance {:.4}, {} evaluators",
                paper.paper_id, paper.consensus, paper.variance, paper.evaluator_count
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl TerminalWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_results(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        self.print_header(results)?;
        self.print_summary(results)?;
        self.print_kappa_table(results)?;
        self.print_groups(results)?;
        Ok(())
    }
}

impl<W: Write> TerminalWriter<W> {
    fn print_header(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Evaluation Agreement Report".bold().blue())?;
        writeln!(self.writer, "{}", "===========================".blue())?;
        writeln!(self.writer, "Mode: {}", results.analysis_mode.to_string().cyan())?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_summary(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        let stats = &results.overall_stats;
        writeln!(self.writer, "{}", "Summary:".bold())?;
        writeln!(
            self.writer,
            "  Papers: {} unique ({} sessions, {} with 2+ evaluators)",
            stats.unique_papers, stats.total_papers, stats.papers_with_multiple_evaluators
        )?;
        writeln!(
            self.writer,
            "  Evaluations: {} by {} evaluators",
            stats.total_evaluations, stats.unique_evaluators
        )?;
        writeln!(
            self.writer,
            "  Fleiss' kappa: {}",
            colored_kappa(&results.fleiss_kappa)
        )?;
        writeln!(
            self.writer,
            "  Variance agreement: {}",
            fmt_score(results.variance_agreement.overall)
        )?;
        let cross = &results.cross_paper_consistency;
        writeln!(
            self.writer,
            "  Cross-paper CV: {} ({})",
            fmt_percent(cross.coefficient_of_variation),
            cross
                .consistency
                .map_or_else(|| "n/a".to_string(), |level| level.to_string())
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_kappa_table(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Component", "Kappa", "Interpretation", "Papers", "Variance agr."]);

        for (component, kappa) in &results.component_kappa {
            let variance = results
                .variance_agreement
                .by_component
                .get(component)
                .copied()
                .flatten();
            table.add_row(vec![
                component.display_name().to_string(),
                fmt_score(kappa.kappa),
                kappa.interpretation.clone(),
                kappa.n.to_string(),
                fmt_score(variance),
            ]);
        }
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_groups(&mut self, results: &AgreementMetrics) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Agreement by group:".bold())?;
        for (tier, group) in &results.expertise_agreement.within_tier {
            writeln!(self.writer, "  {:<13} {}", tier.label(), group_summary(group))?;
        }
        writeln!(
            self.writer,
            "  {:<13} {}",
            "Expert/Junior",
            fmt_score(results.expertise_agreement.cross_tier.agreement)
        )?;
        writeln!(
            self.writer,
            "  {:<13} {}",
            "ORKG users",
            group_summary(&results.orkg_agreement.with_orkg)
        )?;
        writeln!(
            self.writer,
            "  {:<13} {}",
            "Non-users",
            group_summary(&results.orkg_agreement.without_orkg)
        )?;
        Ok(())
    }
}

fn colored_kappa(kappa: &FleissKappa) -> String {
    let text = kappa_summary(kappa);
    match kappa.kappa {
        Some(value) if value >= 0.6 => text.green().to_string(),
        Some(value) if value >= 0.2 => text.yellow().to_string(),
        Some(_) => text.red().to_string(),
        None => text.dimmed().to_string(),
    }
}

pub fn create_writer<'a, W: Write + 'a>(format: OutputFormat, writer: W) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

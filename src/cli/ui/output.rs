use console::style;

use crate::course::RunSummary;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<22} {}", style(format!("{}:", label)).dim(), value);
    }

    /// End-of-run report
    pub fn summary(&self, summary: &RunSummary) {
        self.section("Run Summary");
        self.field("Run", &summary.run_id);
        self.field("Schema properties", summary.schema_properties);
        self.field("Topics generated", summary.generated);
        if summary.reused > 0 {
            self.field("Topics reused", summary.reused);
        }
        self.field("Topics failed", summary.failed.len());
        self.field("Quality flagged", summary.quality_flagged);
        self.field("Persistence failures", summary.persistence_failures);
        self.field("Documents written", summary.documents.len());
        if let Some(path) = &summary.aggregate {
            self.field("Aggregate", path.display());
        }
        self.field("Duration", format!("{:.1}s", summary.duration.as_secs_f64()));

        for failure in &summary.failed {
            self.error(&format!(
                "{} / {} / {}: {}",
                failure.level, failure.module, failure.topic, failure.reason
            ));
        }
        for path in &summary.documents {
            self.info(&format!("{}", path.display()));
        }

        if summary.is_clean() {
            self.success("Course generation complete");
        } else {
            self.warning("Course generation finished with failures");
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

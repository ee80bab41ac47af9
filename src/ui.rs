use colored::Colorize;
use declarative::{
    ApplyResult, Attribute, AttributeChange, AttributeType, ChangeAction, ConfirmCallback,
    Diagnostics, ExecuteSummary, Known, PathStep, PlanReport, PreviewAction, ProgressCallback,
    Registry, Schema, Severity, Value,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Shown in place of sensitive values
pub const SENSITIVE: &str = "(sensitive value)";

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Plans
// ============================================================================

/// Print every pending change in `report`, then a summary line
pub fn plan_report(registry: &Registry, report: &PlanReport) {
    for (address, diagnostics) in &report.failures {
        error(&format!("{address}: planning failed"));
        print_diagnostics(diagnostics);
    }

    let changed: Vec<_> = report
        .previews
        .iter()
        .filter(|p| p.action != PreviewAction::NoOp)
        .collect();

    if changed.is_empty() {
        if !report.has_failures() {
            println!();
            println!("  {} No changes needed", "✓".green());
        }
        return;
    }

    println!();
    println!("┌─ {} ─────────────────────────────────────────┐", "Plan".bold());
    for preview in &changed {
        let schema = registry.resource_schema(&preview.address.type_name).ok();
        let (symbol, verb) = match preview.action {
            PreviewAction::Create => ("+".green(), "will be created"),
            PreviewAction::Update => ("~".yellow(), "will be updated in place"),
            PreviewAction::Delete => ("-".red(), "will be destroyed"),
            PreviewAction::Refresh => ("↻".cyan(), "will be refreshed"),
            PreviewAction::NoOp => (" ".normal(), "has no changes"),
        };
        println!("│");
        println!(
            "│ {} {} {}",
            symbol,
            preview.address.to_string().bold(),
            verb.dimmed()
        );
        for change in preview.changes.actionable() {
            println!("│     {}", format_change(schema, change));
        }
    }
    println!("│");

    let count = |action| {
        report
            .previews
            .iter()
            .filter(|p| p.action == action)
            .count()
    };
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to add, {} to change, {} to destroy",
        count(PreviewAction::Create).to_string().green(),
        count(PreviewAction::Update).to_string().yellow(),
        count(PreviewAction::Delete).to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// One change line, with sensitive values masked
pub fn format_change(schema: Option<&Schema>, change: &AttributeChange) -> String {
    let (ty, sensitive) = schema.map_or((None, false), |s| lookup(s, change.path.steps()));
    let show = |value: &Value| {
        if sensitive && !value.is_null() && !value.is_unknown() {
            SENSITIVE.to_string()
        } else {
            format_value(value, ty)
        }
    };

    match change.action {
        ChangeAction::Create => format!("{} {} = {}", "+".green(), change.path, show(&change.new)),
        ChangeAction::Delete => format!("{} {} = {}", "-".red(), change.path, show(&change.old)),
        ChangeAction::Update => format!(
            "{} {}: {} → {}",
            "~".yellow(),
            change.path,
            show(&change.old),
            show(&change.new)
        ),
        ChangeAction::NoOp => format!("  {} = {}", change.path, show(&change.new)),
    }
}

/// Type and sensitivity of the attribute at `steps`
fn lookup<'s>(schema: &'s Schema, steps: &[PathStep]) -> (Option<&'s AttributeType>, bool) {
    let mut schema = schema;
    let mut ty: Option<&AttributeType> = None;

    for step in steps {
        match step {
            PathStep::Attribute(name) => {
                match ty {
                    None => {}
                    Some(AttributeType::Object(inner)) => schema = inner,
                    Some(_) => return (None, false),
                }
                let Some(attribute) = schema.attribute(name) else {
                    return (None, false);
                };
                if attribute.sensitive {
                    return (Some(&attribute.ty), true);
                }
                ty = Some(&attribute.ty);
            }
            PathStep::Index(_) => match ty {
                Some(AttributeType::List(element)) => ty = Some(&**element),
                _ => return (None, false),
            },
        }
    }

    (ty, false)
}

/// Render a value, masking sensitive attributes of nested objects
pub fn format_value(value: &Value, ty: Option<&AttributeType>) -> String {
    match (value, ty) {
        (Value::Known(Known::List(items)), Some(AttributeType::List(element))) => {
            let items: Vec<_> = items
                .iter()
                .map(|item| format_value(item, Some(&**element)))
                .collect();
            format!("[{}]", items.join(", "))
        }
        (Value::Known(Known::Object(doc)), Some(AttributeType::Object(schema))) => {
            let fields: Vec<_> = doc
                .iter()
                .map(|(name, value)| match schema.attribute(name) {
                    Some(attribute) if attribute.sensitive && value.is_known() => {
                        format!("{name} = {SENSITIVE}")
                    }
                    attribute => format!(
                        "{name} = {}",
                        format_value(value, attribute.map(|a| &a.ty))
                    ),
                })
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        _ => value.to_string(),
    }
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        let symbol = match diagnostic.severity {
            Severity::Error => "✗".red(),
            Severity::Warning => "⚠".yellow(),
        };
        eprintln!("    {} {}", symbol, diagnostic);
    }
}

/// Print the final summary of an execution
pub fn summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return;
    }

    let mut parts = Vec::new();
    for (count, label) in [
        (summary.created, "created"),
        (summary.updated, "updated"),
        (summary.deleted, "destroyed"),
        (summary.drifted, "drifted"),
        (summary.gone, "gone"),
        (summary.no_change, "unchanged"),
        (summary.skipped, "skipped"),
    ] {
        if count > 0 {
            parts.push(format!("{count} {label}"));
        }
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed).red().to_string());
    }
    let detail = if parts.is_empty() {
        "nothing to do".to_string()
    } else {
        parts.join(", ")
    };

    if summary.is_success() {
        println!("  {} Complete: {}", "✓".green(), detail);
    } else {
        println!("  {} Finished with errors: {}", "✗".red(), detail);
    }
}

// ============================================================================
// Schema
// ============================================================================

pub fn schema_tree(name: &str, schema: &Schema) {
    println!();
    println!("{} {}", name.bold(), format!("(v{})", schema.version()).dimmed());
    if let Some(description) = schema.description() {
        dim(description);
    }
    print_attributes(schema, 1);
}

fn print_attributes(schema: &Schema, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, attribute) in schema.attributes() {
        println!(
            "{}{} {} {}",
            indent,
            name.cyan(),
            type_name(&attribute.ty),
            modifiers(attribute).dimmed()
        );
        if let Some(description) = &attribute.description {
            println!("{}  {}", indent, description.dimmed());
        }
        let mut ty = &attribute.ty;
        while let AttributeType::List(element) = ty {
            ty = &**element;
        }
        if let AttributeType::Object(inner) = ty {
            print_attributes(inner, depth + 1);
        }
    }
}

pub fn type_name(ty: &AttributeType) -> String {
    match ty {
        AttributeType::Primitive(kind) => kind.value_kind().to_string(),
        AttributeType::List(element) => format!("list({})", type_name(element)),
        AttributeType::Object(_) => "object".to_string(),
    }
}

fn modifiers(attribute: &Attribute) -> String {
    let mut parts = Vec::new();
    if attribute.required {
        parts.push("required");
    }
    if attribute.optional {
        parts.push("optional");
    }
    if attribute.computed {
        parts.push("computed");
    }
    if attribute.sensitive {
        parts.push("sensitive");
    }
    if attribute.immutable {
        parts.push("immutable");
    }
    format!("[{}]", parts.join(", "))
}

// ============================================================================
// Callbacks
// ============================================================================

/// Progress bar over a batch; per-resource results are printed above it
pub struct BarProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            quiet,
        }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if self.quiet {
            return;
        }
        self.bar = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            self.bar.set_style(style.progress_chars("=>-"));
        }
    }

    fn on_resource_start(&mut self, address: &str) {
        self.bar.set_message(address.to_string());
    }

    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult) {
        if !self.quiet || !result.is_success() {
            self.bar.println(format_result(address, result));
        }
        if let ApplyResult::Failed { diagnostics } = result {
            for diagnostic in diagnostics {
                self.bar.println(format!("    {diagnostic}"));
            }
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

pub fn format_result(address: &str, result: &ApplyResult) -> String {
    match result {
        ApplyResult::Created => format!("  {} {} created", "✓".green(), address),
        ApplyResult::Updated => format!("  {} {} updated", "✓".green(), address),
        ApplyResult::Deleted => format!("  {} {} destroyed", "✓".green(), address),
        ApplyResult::NoChange => format!("  {} {} {}", "·".dimmed(), address, "unchanged".dimmed()),
        ApplyResult::Drifted { changes } => format!(
            "  {} {} drifted ({} change(s) found remotely)",
            "⚠".yellow(),
            address,
            changes
        ),
        ApplyResult::Gone => format!(
            "  {} {} no longer exists remotely",
            "⚠".yellow(),
            address
        ),
        ApplyResult::Skipped { reason } => {
            format!("  {} {} skipped: {}", "·".dimmed(), address, reason)
        }
        ApplyResult::Failed { .. } => format!("  {} {} failed", "✗".red(), address),
    }
}

/// Interactive yes/no prompt
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{AttributePath, Document};

    fn schema() -> Schema {
        Schema::new()
            .with_attribute("username", Attribute::required(AttributeType::string()))
            .with_attribute(
                "password",
                Attribute::required(AttributeType::string()).sensitive(),
            )
            .with_attribute(
                "tokens",
                Attribute::optional(AttributeType::list(AttributeType::object(
                    Schema::new()
                        .with_attribute("name", Attribute::required(AttributeType::string()))
                        .with_attribute(
                            "secret",
                            Attribute::required(AttributeType::string()).sensitive(),
                        ),
                ))),
            )
    }

    fn change(path: AttributePath, old: Value, new: Value, action: ChangeAction) -> AttributeChange {
        AttributeChange {
            path,
            old,
            new,
            action,
        }
    }

    #[test]
    fn test_sensitive_values_are_masked() {
        colored::control::set_override(false);
        let schema = schema();

        let line = format_change(
            Some(&schema),
            &change(
                AttributePath::attribute("password"),
                Value::string("old-secret"),
                Value::string("new-secret"),
                ChangeAction::Update,
            ),
        );
        assert!(!line.contains("secret\""), "{line}");
        assert!(line.contains(SENSITIVE));

        let line = format_change(
            Some(&schema),
            &change(
                AttributePath::attribute("username"),
                Value::Null,
                Value::string("education"),
                ChangeAction::Create,
            ),
        );
        assert_eq!(line, "+ username = \"education\"");
    }

    #[test]
    fn test_nested_sensitive_values_are_masked() {
        colored::control::set_override(false);
        let schema = schema();
        let tokens = Value::list([Value::object(
            Document::new().with("name", "ci").with("secret", "hunter2"),
        )]);

        let line = format_change(
            Some(&schema),
            &change(
                AttributePath::attribute("tokens"),
                Value::Null,
                tokens,
                ChangeAction::Create,
            ),
        );
        assert!(!line.contains("hunter2"), "{line}");
        assert!(line.contains("name = \"ci\""));

        let path = AttributePath::attribute("tokens").index(0).child("secret");
        let line = format_change(
            Some(&schema),
            &change(
                path,
                Value::string("a"),
                Value::string("b"),
                ChangeAction::Update,
            ),
        );
        assert!(line.contains(SENSITIVE));
    }

    #[test]
    fn test_unknown_is_not_masked() {
        colored::control::set_override(false);
        let schema = schema();
        let line = format_change(
            Some(&schema),
            &change(
                AttributePath::attribute("password"),
                Value::Null,
                Value::Unknown,
                ChangeAction::Create,
            ),
        );
        assert!(line.contains("(known after apply)"));
    }

    #[test]
    fn test_type_name() {
        let ty = AttributeType::list(AttributeType::object(Schema::new()));
        assert_eq!(type_name(&ty), "list(object)");
        assert_eq!(type_name(&AttributeType::int64()), "int64");
    }

    #[test]
    fn test_format_result() {
        colored::control::set_override(false);
        assert_eq!(
            format_result("hashicups_order.edu", &ApplyResult::Created),
            "  ✓ hashicups_order.edu created"
        );
    }
}

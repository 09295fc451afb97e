use serde::Serialize;
use sprintscope_core::{analyze, AnalysisReport, DataQualityIssue};

use super::context::{print_json, CommandResult, Context, GlobalArgs};

pub fn report(global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;

    let report: AnalysisReport = ctx.cached("report", &(), true, |ctx| {
        let mut rng = ctx.rng();
        Ok(analyze(&ctx.dataset, &ctx.config, &mut rng)?)
    })?;
    print_json(&report)
}

#[derive(Serialize)]
struct ValidationSummary<'a> {
    sprints: usize,
    stories: usize,
    initiatives: usize,
    team: usize,
    issues: &'a [DataQualityIssue],
}

/// Prints every data-quality issue; exits non-zero when there are any.
pub fn validate(global: &GlobalArgs) -> CommandResult {
    let ctx = Context::load(global)?;
    let issues = ctx.dataset.validate();

    print_json(&ValidationSummary {
        sprints: ctx.dataset.sprints.len(),
        stories: ctx.dataset.stories.len(),
        initiatives: ctx.dataset.initiatives.len(),
        team: ctx.dataset.team.len(),
        issues: &issues,
    })?;

    if issues.is_empty() {
        Ok(())
    } else {
        Err(format!("{} data-quality issue(s) found", issues.len()).into())
    }
}

use crate::dashboard::Sources;
use crate::settings::Settings;

use super::{load_dashboard, text, FilterArgs};

pub fn run(sources: &Sources, settings: &Settings, filters: &FilterArgs, json: bool) -> anyhow::Result<()> {
    let spec = filters.to_spec(settings.payment_mode)?;
    let dashboard = load_dashboard(sources)?;
    let view = dashboard.apply(&spec);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", text::format_dashboard(&view, &spec));
    }
    Ok(())
}

use crate::dashboard::Sources;

use super::{load_dashboard, text};

pub fn run(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let options = load_dashboard(sources)?.options();
    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        println!("{}", text::format_options(&options));
    }
    Ok(())
}

//! `glu info`

use crate::cli::OutputManager;
use crate::error::Result;
use crate::project::ProjectInfo;

/// Print the metadata discovered for the current directory
pub(super) fn execute_info(output: &OutputManager) -> Result<()> {
    let info = ProjectInfo::discover(&std::env::current_dir()?)?;

    output.println(&format!("name:    {}", info.name));
    output.println(&format!("repo:    {}", info.repo));
    output.println(&format!(
        "version: {}",
        info.version.as_deref().unwrap_or("")
    ));
    Ok(())
}

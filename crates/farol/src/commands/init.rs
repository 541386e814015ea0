use anyhow::Result;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Farol Configuration

[llm]
# Falls back to the GEMINI_API_KEY env var when empty.
gemini_api_key = ""
model = ""

[retrieval]
skills_root = "./skills"
auto_local_context = true
# Empty means "$HOME".
local_context_roots = []
# Empty means ./n8n-workflows, ./awesome-n8n-templates, ./n8n-free-templates.
n8n_template_roots = []

[fs_agent]
enabled = false
auto_approve_writes = false
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}

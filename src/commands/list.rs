use crate::build::ProjectConfig;
use crate::result::Result;
use crate::target::Registry;

pub fn execute(config: &ProjectConfig, registry: &Registry) -> Result<()> {
    if registry.is_empty() {
        println!("No targets registered");
        return Ok(());
    }

    let default = config.project.default_target.as_deref();
    for line in render(registry, default) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per target: name, a `*` for the default, and the description.
pub fn render(registry: &Registry, default: Option<&str>) -> Vec<String> {
    let width = registry.names().map(str::len).max().unwrap_or(0);

    registry
        .names()
        .map(|name| {
            let marker = if Some(name) == default { "*" } else { " " };
            let description = registry
                .get(name)
                .ok()
                .and_then(|t| t.description())
                .unwrap_or("");
            format!("{} {:<width$}  {}", marker, name, description, width = width)
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::CommandTarget;

    #[test]
    fn default_target_is_marked() {
        let mut registry = Registry::new();
        registry.register(
            "app",
            CommandTarget::new(Some("Build the app".into()), Vec::new(), Vec::new()),
        );
        registry.register("docs", CommandTarget::new(None, Vec::new(), Vec::new()));

        assert_eq!(
            render(&registry, Some("app")),
            ["* app   Build the app", "  docs"]
        );
    }
}

//! `pagecraft scripts` — inspect and manage the script store.

use pagecraft_config::AppConfig;

pub async fn list(domain: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::build_store(&config);

    let scripts = store.list_for_domain(domain).await?;
    if scripts.is_empty() {
        println!("  No scripts stored for {domain}");
        return Ok(());
    }

    println!("  Scripts for {domain}:");
    for script in scripts {
        let state = if script.enabled { "enabled" } else { "disabled" };
        println!(
            "  {}  {}  [{}]  updated {}",
            script.id,
            script.name,
            state,
            script.updated_at.format("%Y-%m-%d %H:%M")
        );
        if !script.description.is_empty() {
            println!("      {}", script.description);
        }
    }
    Ok(())
}

pub async fn show(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::build_store(&config);

    let Some(script) = store.get(id).await? else {
        return Err(format!("No script with id {id}").into());
    };

    println!("  Name:    {}", script.name);
    println!("  Domain:  {}", script.domain);
    println!("  Prompt:  {}", script.prompt);
    println!("  Model:   {}", script.model);
    println!("  Created: {}", script.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Updated: {}", script.updated_at.format("%Y-%m-%d %H:%M"));
    println!();
    println!("{}", script.code);
    Ok(())
}

pub async fn delete(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = super::build_store(&config);

    if store.delete(id).await? {
        println!("  Deleted script {id}");
        Ok(())
    } else {
        Err(format!("No script with id {id}").into())
    }
}

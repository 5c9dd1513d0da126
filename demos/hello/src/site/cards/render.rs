use std::fs;
use trellis::{RenderOutput, TemplateRenderer, context};

pub fn card() -> RenderOutput {
    RenderOutput::new(context! { name => "Ferris" }, ["cards/card.html"])
}

pub fn sitemap_(renderer: &TemplateRenderer) -> anyhow::Result<()> {
    fs::write(
        renderer.output_root().join("sitemap.txt"),
        "/about\n/cards/card\n/contact\n",
    )?;
    Ok(())
}

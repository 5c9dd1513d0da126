mod generated;
mod site;

fn main() -> anyhow::Result<()> {
    trellis::run(generated::registry())
}

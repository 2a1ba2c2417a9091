use companion_gen::{Builder, Error};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let result = Builder::new().graph("graph/settings.json").compile();
    if let Err(Error::Diagnostics(diagnostics)) = &result {
        for diagnostic in diagnostics {
            println!("cargo:warning={diagnostic}");
        }
    }
    result?;
    Ok(())
}

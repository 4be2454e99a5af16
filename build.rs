use std::error::Error;
use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn Error>> {
    // Tarball builds have no .git; the version string then ends in "unknown"
    if EmitBuilder::builder()
        .fail_on_error()
        .git_describe(true, false, None)
        .emit()
        .is_err()
    {
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
    }
    Ok(())
}

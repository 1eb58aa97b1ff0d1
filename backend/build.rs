use std::error::Error;
use std::fs;
use std::path::Path;

// Embeds the built frontend: copies ../frontend/dist into static/dist when it
// exists, otherwise leaves the placeholder page in place.
fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = Path::new("static");
    let dist_dir = Path::new("../frontend/dist");

    if dist_dir.exists() {
        let _ = fs::remove_dir_all(out_dir);
        fs::create_dir_all(out_dir)?;
        fs_extra::dir::copy(
            dist_dir,
            out_dir,
            &fs_extra::dir::CopyOptions::new().overwrite(true),
        )?;
    } else {
        fs::create_dir_all(out_dir.join("dist"))?;
    }
    println!("cargo:rerun-if-changed=../frontend/dist");
    Ok(())
}

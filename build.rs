// build.rs

fn main() {
    // Generate build info (VERGEN_BUILD_TIMESTAMP for the landing page)
    vergen::EmitBuilder::builder()
        .all_build()
        .emit()
        .expect("Unable to generate build info");
}

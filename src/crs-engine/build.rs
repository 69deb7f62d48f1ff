fn link_native_library() {
    println!("cargo:rerun-if-env-changed=CRS_API_LIB_DIR");

    if let Ok(dir) = std::env::var("CRS_API_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }
    println!("cargo:rustc-link-lib=dylib=crs-api");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if std::env::var_os("CARGO_FEATURE_NATIVE").is_some() {
        link_native_library();
    }
}

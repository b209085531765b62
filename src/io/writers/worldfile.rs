use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// World file extension for a raster path (`.tfw` for TIFF, `.wld` otherwise).
pub fn world_file_path(output_image: &Path) -> PathBuf {
    let ext = output_image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let world_ext = match ext.as_str() {
        "tif" | "tiff" => "tfw",
        "png" => "pgw",
        "jpg" | "jpeg" => "jgw",
        _ => "wld",
    };
    output_image.with_extension(world_ext)
}

/// World file lines for a GDAL geotransform, in pixel-center convention.
pub fn world_file_lines(geotransform: [f64; 6]) -> [f64; 6] {
    // A: pixel size in X, D: rotation about Y, B: rotation about X, E: pixel size Y
    // C, F: center of upper-left pixel
    let a = geotransform[1];
    let d = geotransform[4];
    let b = geotransform[2];
    let e = geotransform[5];
    let c = geotransform[0] + 0.5 * a + 0.5 * b;
    let f = geotransform[3] + 0.5 * d + 0.5 * e;
    [a, d, b, e, c, f]
}

/// Write a world file next to the raster image using the provided geotransform.
pub fn write_world_file(output_image: &Path, geotransform: [f64; 6]) -> std::io::Result<PathBuf> {
    let world_path = world_file_path(output_image);
    let mut file = File::create(&world_path)?;
    for value in world_file_lines(geotransform) {
        writeln!(file, "{:.12}", value)?;
    }
    Ok(world_path)
}

/// Write a .prj file with the provided projection (WKT or EPSG:XXXX)
pub fn write_prj_file(output_image: &Path, projection: &str) -> std::io::Result<PathBuf> {
    let prj_path = output_image.with_extension("prj");
    std::fs::write(&prj_path, projection.as_bytes())?;
    Ok(prj_path)
}

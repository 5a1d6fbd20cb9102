pub const GENTLE_COORDS_DISPLAY_VERSION: &str = env!("GENTLE_COORDS_DISPLAY_VERSION");
pub const GENTLE_COORDS_BUILD_N: &str = env!("GENTLE_COORDS_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "GENtle coordinates {}\nBuild {}\nPositions, points and topologies on linear and circular sequences",
        GENTLE_COORDS_DISPLAY_VERSION, GENTLE_COORDS_BUILD_N
    )
}

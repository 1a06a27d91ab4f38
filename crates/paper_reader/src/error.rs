use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No key points given; pass --key-point or --key-points-file")]
    NoKeyPoints,

    #[error("Key points file {0} has no entries")]
    EmptyKeyPointsFile(PathBuf),
}

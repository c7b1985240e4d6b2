use std::path::Path;

use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, BufReader, Lines},
};

/// Open a file for line-by-line reading, without loading it all into memory
pub async fn read_lines<P: AsRef<Path>>(path: P) -> io::Result<Lines<BufReader<File>>> {
    let f = File::open(path).await?;

    Ok(BufReader::new(f).lines())
}

/// Make sure a directory exists, creating it and any missing parents
pub async fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

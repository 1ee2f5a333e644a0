use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path rejected by traversal filter: {0}")]
    TraversalRejected(String),

    #[error("Path could not be resolved: {path}: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

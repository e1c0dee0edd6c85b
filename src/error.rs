use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No suitable edges near location")]
    NoSuitableEdges,
    #[error("Missing graph tile for {0}")]
    MissingTile(crate::model::GraphId),
    #[error("No date time set on the origin location")]
    MissingDateTime,
    #[error("Invalid date time: {0}")]
    InvalidDateTime(String),
}

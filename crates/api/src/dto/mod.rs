pub mod status;

pub use status::{
    CycleResponse, GenerationResponse, LevelResponse, SourceStatusResponse, StatusResponse,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON body of every error the API reports.
#[derive(Deserialize, Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RsvpAccepted {
    pub ok: bool,
    pub id: Uuid,
}

#[derive(Deserialize)]
pub struct CompressQuery {
    pub compress: Option<String>,
}

#[derive(Deserialize)]
pub struct EdgeColorQuery {
    pub src: String,
}

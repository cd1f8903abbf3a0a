use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Body of the `/api/test` liveness endpoint kept for dashboard compatibility.
#[derive(Serialize, Debug)]
pub struct ApiTest {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

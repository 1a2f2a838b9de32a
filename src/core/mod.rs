pub mod response;
pub mod service_url;
pub mod verifier;

pub use crate::domain::model::{
    CasIdentity, CasResponse, HttpResponse, RequestContext, ValidationRequest, VerifierConfig,
};
pub use crate::domain::ports::{ConfigProvider, HttpClient, RequestAccessor};
pub use crate::utils::error::Result;

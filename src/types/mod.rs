pub mod conversation;
pub mod intent;
pub mod recommendation;
pub mod request;
pub mod response;
pub mod weather;

pub use conversation::{ChatMessage, HistoryEntry, Role, SessionContext};
pub use intent::{Intent, IntentType};
pub use recommendation::{Place, TimeOfDay, TravelRecommendation};
pub use request::RecommendationRequest;
pub use response::{AdvisorResponse, ResponseOrigin, ALL_FAILED_PROVIDER};
pub use weather::{CurrentConditions, ForecastEntry, WeatherSnapshot};

//! Track and elective recommendation

mod keywords;
mod recommender;

pub use keywords::extract_keywords;
pub use recommender::{ApplicantProfile, Elective, Recommendation, Recommender};

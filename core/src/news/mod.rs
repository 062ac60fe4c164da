pub mod api;
pub mod poller;
pub mod tools;

pub use api::{JobApi, JobStatus, MasaClient, NewsItem};
pub use poller::{JobPoller, NO_RESULTS, NO_TITLE, fetch_crypto_news};
pub use tools::{FetchCryptoNewsTool, SearchCryptoNewsTool};

// Portfolio publication pipeline.
// Deploys a static-site bundle to the user's GitHub repository through the Git
// Data API and enables GitHub Pages. All GitHub calls go through github_client.

pub mod commit;
pub mod error;
pub mod handlers;
pub mod hosting;
pub mod messages;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod tree_builder;

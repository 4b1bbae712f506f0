pub mod delegate;
pub mod init_config;
pub mod undelegate;
pub mod unvote;
pub mod update_config;
pub mod update_config_admin;
pub mod vote;

pub use delegate::*;
pub use init_config::*;
pub use undelegate::*;
pub use unvote::*;
pub use update_config::*;
pub use update_config_admin::*;
pub use vote::*;

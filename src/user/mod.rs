pub mod credentials;
pub mod password;

pub use credentials::{
    CredentialStore, InMemoryCredentialStore, PostgresCredentialStore, UserCredential,
};

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::ids::UserId;

use super::{
    avatar::{self, DEFAULT_BIO},
    AuthError, AuthGateway, Credentials, Profile, Registration, UserDirectory, MIN_PASSWORD_LEN,
};

struct Account {
    email: String,
    password_hash: String,
    profile: Profile,
}

#[derive(Default)]
struct Accounts {
    by_id: HashMap<UserId, Account>,
    // unique: email (lowercased)
    by_email: HashMap<String, UserId>,
    // unique: handle (lowercased)
    by_handle: HashMap<String, UserId>,
}

impl Accounts {
    fn check_unique(&self, email: &str, handle: &str) -> Result<(), AuthError> {
        if self.by_email.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        if self.by_handle.contains_key(&handle.to_lowercase()) {
            return Err(AuthError::HandleTaken(handle.to_owned()));
        }
        Ok(())
    }
}

/// In-memory accounts with bcrypt password hashes.
pub struct AccountStore {
    accounts: RwLock<Accounts>,
    bcrypt_cost: u32,
}

impl AccountStore {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            accounts: RwLock::new(Accounts::default()),
            bcrypt_cost,
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_owned())
}

async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
) -> Result<T, AuthError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))?
        .map_err(|err| AuthError::Internal(err.to_string()))
}

#[async_trait]
impl AuthGateway for AccountStore {
    async fn verify(&self, Credentials { email, password }: Credentials) -> Result<Profile, AuthError> {
        let email = email.trim().to_lowercase();
        let found = {
            let accounts = self.accounts.read();
            accounts
                .by_email
                .get(&email)
                .and_then(|id| accounts.by_id.get(id))
                .map(|account| (account.password_hash.clone(), account.profile.clone()))
        };
        let Some((hash, profile)) = found else {
            return Err(AuthError::InvalidCredentials);
        };

        if blocking(move || bcrypt::verify(password, &hash)).await? {
            Ok(profile)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn create(&self, registration: Registration) -> Result<Profile, AuthError> {
        let email = required(&registration.email, "email")?.to_lowercase();
        let first_name = required(&registration.first_name, "firstName")?;
        let last_name = required(&registration.last_name, "lastName")?;
        let handle = required(&registration.username, "username")?;
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        // fail fast before paying for the hash
        self.accounts.read().check_unique(&email, &handle)?;

        let cost = self.bcrypt_cost;
        let password = registration.password;
        let password_hash = blocking(move || bcrypt::hash(password, cost)).await?;

        let bio = registration
            .bio
            .map(|bio| bio.trim().to_owned())
            .filter(|bio| !bio.is_empty())
            .unwrap_or_else(|| DEFAULT_BIO.to_owned());
        let profile = Profile {
            id: UserId::new(),
            display_name: format!("{first_name} {last_name}"),
            avatar: avatar::avatar_url(&first_name, &last_name),
            first_name,
            last_name,
            handle,
            bio,
        };

        let mut accounts = self.accounts.write();
        // another registration may have won the race while hashing
        accounts.check_unique(&email, &profile.handle)?;

        accounts.by_email.insert(email.clone(), profile.id);
        accounts.by_handle.insert(profile.handle.to_lowercase(), profile.id);
        accounts.by_id.insert(
            profile.id,
            Account {
                email,
                password_hash,
                profile: profile.clone(),
            },
        );

        tracing::info!(user = %profile.id, handle = %profile.handle, "account created");
        Ok(profile)
    }

    fn profile(&self, id: &UserId) -> Option<Profile> {
        self.accounts.read().by_id.get(id).map(|account| account.profile.clone())
    }

    fn users(&self) -> Vec<Profile> {
        let mut users: Vec<Profile> = self
            .accounts
            .read()
            .by_id
            .values()
            .map(|account| account.profile.clone())
            .collect();
        users.sort_by_key(|profile| profile.id);
        users
    }
}

impl UserDirectory for AccountStore {
    fn contains(&self, id: &UserId) -> bool {
        self.accounts.read().by_id.contains_key(id)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, UserRepository},
    models::{
        auth::{Claims, PortalClaims, Role, User},
        customer::Customer,
    },
};

const STAFF_TOKEN_DAYS: i64 = 7;
const PORTAL_TOKEN_DAYS: i64 = 1;

// Quem o /me do portal identificou: agente (usuário interno) ou cliente.
pub enum PortalIdentity {
    Agent(User),
    Customer(Customer),
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    customer_repo: CustomerRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        customer_repo: CustomerRepository,
        jwt_secret: String,
    ) -> Self {
        Self { user_repo, customer_repo, jwt_secret }
    }

    pub async fn register_user(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(User, String), AppError> {
        // Hashing fora do runtime async (bcrypt é pesado de CPU)
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .user_repo
            .create(full_name, email, &hashed_password, role)
            .await?;

        let token = self.create_token(&user)?;
        Ok((user, token))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok((user, token))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(STAFF_TOKEN_DAYS);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // --- PORTAL ---
    // Mesmo segredo, cookie e claims separados. Agente entra com a conta
    // interna; cliente precisa de portal_access_enabled + senha própria.

    pub async fn portal_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(PortalIdentity, String), AppError> {
        if let Some(user) = self.user_repo.find_by_email(email).await? {
            let password_clone = password.to_owned();
            let hash_clone = user.password_hash.clone();
            let valid = tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

            if valid {
                let token = self.create_portal_token(user.id, true)?;
                return Ok((PortalIdentity::Agent(user), token));
            }
            return Err(AppError::InvalidCredentials);
        }

        let customer = self
            .customer_repo
            .find_portal_login(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let stored_hash = customer
            .portal_password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let valid = tokio::task::spawn_blocking(move || verify(&password_clone, &stored_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_portal_token(customer.id, false)?;
        Ok((PortalIdentity::Customer(customer), token))
    }

    pub fn create_portal_token(&self, subject: Uuid, is_agent: bool) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(PORTAL_TOKEN_DAYS);

        let claims = PortalClaims {
            sub: subject,
            is_agent,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub fn decode_portal_token(&self, token: &str) -> Result<PortalClaims, AppError> {
        let token_data = decode::<PortalClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    /// Resolve a sessão do portal para a identidade correspondente.
    pub async fn resolve_portal_identity(
        &self,
        claims: &PortalClaims,
    ) -> Result<PortalIdentity, AppError> {
        if claims.is_agent {
            let user = self
                .user_repo
                .find_by_id(claims.sub)
                .await?
                .ok_or(AppError::InvalidToken)?;
            Ok(PortalIdentity::Agent(user))
        } else {
            let customer = self
                .customer_repo
                .find_by_id(claims.sub)
                .await?
                .ok_or(AppError::InvalidToken)?;
            Ok(PortalIdentity::Customer(customer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        // Pool preguiçoso: nenhum teste aqui toca o banco.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/teste")
            .expect("pool lazy");
        AuthService::new(
            UserRepository::new(pool.clone()),
            CustomerRepository::new(pool),
            "segredo-de-teste".to_string(),
        )
    }

    #[tokio::test]
    async fn token_do_portal_faz_ida_e_volta() {
        let svc = service();
        let id = Uuid::new_v4();

        let token = svc.create_portal_token(id, true).unwrap();
        let claims = svc.decode_portal_token(&token).unwrap();

        assert_eq!(claims.sub, id);
        assert!(claims.is_agent);
    }

    #[tokio::test]
    async fn token_com_segredo_errado_e_rejeitado() {
        let svc = service();
        let outra = AuthService::new(
            UserRepository::new(
                PgPoolOptions::new().connect_lazy("postgres://localhost/x").unwrap(),
            ),
            CustomerRepository::new(
                PgPoolOptions::new().connect_lazy("postgres://localhost/x").unwrap(),
            ),
            "outro-segredo".to_string(),
        );

        let token = svc.create_portal_token(Uuid::new_v4(), false).unwrap();
        assert!(matches!(
            outra.decode_portal_token(&token),
            Err(AppError::InvalidToken)
        ));
    }
}

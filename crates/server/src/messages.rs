//! User-facing copy returned in JSON bodies.

/// Prompt returned by `GET /` when nobody is signed in.
pub const INDEX_ANONYMOUS: &str = "Faça login para explorar a história do automobilismo!";

/// Successful `POST /signup`.
pub const SIGNUP_OK: &str = "Conta criada com sucesso!";

/// Successful `POST /login`.
pub const LOGIN_OK: &str = "Login realizado com sucesso!";

/// Any failure of `GET /callback`.
pub const OAUTH_FAILED: &str = "Falha na autenticação com Google";

/// `GET /logout`.
pub const LOGOUT_OK: &str = "Logout realizado com sucesso!";

/// `GET /profile` without a session.
pub const LOGIN_REQUIRED: &str = "Faça login primeiro!";

/// `favorite_car` stored for users created through OAuth.
pub const PLACEHOLDER_FAVORITE_CAR: &str = "Nenhum ainda";

/// Greeting returned by `GET /` for a signed-in user.
#[must_use]
pub fn welcome(email: &str) -> String {
    format!("Bem-vindo, {email}! Explore a história do automobilismo!")
}

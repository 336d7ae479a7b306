use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::{AuthToken, MemberCredentials, AUTH_TOKEN_COOKIE},
        },
        db::{admin::Admin, voter::{email_hmac, Voter}},
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate_admin, authenticate_member, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate_admin(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let with_username = doc! {
        "username": &credentials.username,
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No admin found with the provided username and password combination.",
            )
        })?;

    let token = AuthToken::new(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}

#[post("/auth/member", data = "<credentials>", format = "json")]
pub async fn authenticate_member(
    cookies: &CookieJar<'_>,
    credentials: Json<MemberCredentials>,
    voters: Coll<Voter>,
    config: &State<Config>,
) -> Result<()> {
    let with_email_hmac = doc! {
        "email_hmac": email_hmac(&credentials.email, config),
    };

    let voter = voters
        .find_one(with_email_hmac, None)
        .await?
        .filter(|voter| voter.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No member found with the provided email and password combination.",
            )
        })?;

    let token = AuthToken::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok(())
}

#[post("/auth/logout")]
pub async fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::json,
    };

    use crate::model::db::voter::NewVoter;

    use super::*;

    #[backend_test]
    async fn member_login_and_logout(client: Client, db: Database) {
        let config = client.rocket().state::<Config>().unwrap();
        Coll::<NewVoter>::from_db(&db)
            .insert_one(NewVoter::example(config), None)
            .await
            .unwrap();

        // Wrong password is rejected and sets no cookie.
        let bad_credentials = MemberCredentials {
            email: MemberCredentials::example().email,
            password: "not the password".to_string(),
        };
        let response = client
            .post(uri!(authenticate_member))
            .header(ContentType::JSON)
            .body(json!(bad_credentials).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());

        // Unknown email is rejected identically.
        let response = client
            .post(uri!(authenticate_member))
            .header(ContentType::JSON)
            .body(json!(MemberCredentials::example2()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Correct credentials log in.
        let response = client
            .post(uri!(authenticate_member))
            .header(ContentType::JSON)
            .body(json!(MemberCredentials::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        // Logout clears the cookie.
        let response = client.post(uri!(logout)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test(admin)]
    async fn admin_login(client: Client) {
        // The harness has already logged us in; the cookie must be present.
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        // A bad password must not authenticate.
        let bad_credentials = AdminCredentials {
            username: AdminCredentials::example1().username,
            password: "not the password".to_string(),
        };
        let response = client
            .post(uri!(authenticate_admin))
            .header(ContentType::JSON)
            .body(json!(bad_credentials).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}

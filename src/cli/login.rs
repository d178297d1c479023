use colored::Colorize;

use crate::error::Result;
use crate::models::UserProfile;
use crate::session::{Session, SessionStore};

pub fn login(name: Option<String>, email: Option<String>) -> Result<()> {
    let store = SessionStore::default_location();
    let mut user = UserProfile::test_user();
    if let Some(name) = name {
        user.name = name;
    }
    if let Some(email) = email {
        user.email = email;
    }

    store.save(&Session::signed_in(user.clone()))?;
    tracing::info!(email = %user.email, path = %store.path().display(), "signed in");
    println!("Signed in as {} <{}>", user.name.bold(), user.email);
    println!("Development mode: uses a simulated login.");
    Ok(())
}

pub fn logout() -> Result<()> {
    SessionStore::default_location().clear()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami() -> Result<()> {
    let session = SessionStore::default_location().load();
    if !session.is_authenticated() {
        println!("Not signed in. Run `cashdesk login`.");
        return Ok(());
    }
    match &session.user {
        Some(user) => {
            println!("{} <{}>", user.name.bold(), user.email);
            if !user.roles.is_empty() {
                println!("Roles: {}", user.roles.join(", "));
            }
        }
        None => println!("Signed in (no profile stored)."),
    }
    Ok(())
}

//! Session user commands.
//!
//! Authentication happens elsewhere; these only record who is logged in so
//! seller commands can scope to their products.

use bazaar_core::{SessionUser, UserId};
use bazaar_storefront::error::StoreError;
use bazaar_storefront::state::AppState;

use crate::LoginArgs;

#[allow(clippy::print_stdout)]
pub fn login(state: &AppState, args: LoginArgs) -> Result<(), StoreError> {
    let user = SessionUser {
        id: UserId::new(args.id),
        username: args.username,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    state.login(&user)?;
    println!("Logged in as {}", user.display_name());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn logout(state: &AppState) -> Result<(), StoreError> {
    state.logout()?;
    println!("Logged out.");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn whoami(state: &AppState) -> Result<(), StoreError> {
    match state.current_user()? {
        Some(user) => println!("{} <{}> (#{})", user.display_name(), user.email, user.id),
        None => println!("Not logged in."),
    }
    Ok(())
}

use dotenv::dotenv;
use rain_or_shine_client::{RainOrShine, RevocationState};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize the client from RAIN_OR_SHINE_API_URL
    let client = RainOrShine::from_env()?;
    let session = client.session();

    println!("Starting auth example against {}", client.base_url());

    // Silent session restoration, as every page load does first
    match session.restore_session().await {
        Ok(Some(user)) => {
            println!(
                "Welcome back, {}!",
                user.first_name.as_deref().unwrap_or("Athlete")
            );
            println!("Strava ID: {}", user.id);
            println!("Member since: {}", user.member_since);
        }
        Ok(None) => {
            println!("No session; starting the connect flow");

            // The consent screen is a full navigation; here we just print
            // the URL a browser would be sent to.
            if let Some(url) = session.login().await? {
                println!("Open this URL to authorize with Strava:\n  {}", url);
                println!("After the round trip, re-run this example to restore the session.");
            }
            return Ok(());
        }
        Err(err) => {
            println!("Session restore failed: {}", err);
            return Ok(());
        }
    }

    // アカウント連携の取り消しデモ（破壊的なので明示的なオプトイン）
    if std::env::var("RAIN_OR_SHINE_DEMO_REVOKE").as_deref() == Ok("1") {
        println!("\nRevoking access and deleting stored data...");

        session.request_revoke();
        assert_eq!(session.revocation_state(), RevocationState::ConfirmPending);

        match session.confirm_revoke().await {
            Ok(()) => println!("Access revoked; session cleared."),
            Err(err) => println!("Revoke failed, confirmation still open: {}", err),
        }
    } else {
        // Plain sign out keeps the Strava grant and stored data
        println!("\nSigning out");
        session.logout().await;
        println!("Signed out: user = {:?}", session.current_user());
    }

    Ok(())
}

use dotenv::dotenv;
use rain_or_shine_client::RainOrShine;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let client = RainOrShine::from_env()?;
    let session = client.session();

    println!("Starting preferences example");

    let Some(user) = session.restore_session().await? else {
        println!("Not signed in; run the auth example first.");
        return Ok(());
    };

    println!(
        "Weather updates are currently {}",
        if user.weather_enabled { "ON" } else { "OFF" }
    );

    // Write-after-confirm: the local snapshot only changes once the
    // backend has acknowledged the new value.
    match session.toggle_weather_enabled().await {
        Ok(Some(enabled)) => {
            println!(
                "Weather updates are now {}",
                if enabled { "ON" } else { "OFF" }
            );
        }
        Ok(None) => println!("Toggle skipped (no session or a write already in flight)"),
        Err(err) => println!("Toggle failed, value unchanged: {}", err),
    }

    if let Some(user) = session.current_user() {
        println!("Snapshot now says weather_enabled = {}", user.weather_enabled);
    }

    Ok(())
}

//! Token sale walkthrough: deploy, buy, delegate, end the sale

use dapp_token_core::utils::MemoryStorage;
use dapp_token_core::{deploy, format_units, Address, DeploymentConfig, TokenError, Unit};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("🪙 DApp Token - Token Sale Example\n");

    let admin = Address::derive(b"admin");
    let buyer = Address::derive(b"buyer");
    let friend = Address::derive(b"friend");

    // 1. Deploy the token and the sale with the default configuration
    println!("🚀 Deploying...");
    let mut deployment = deploy(&DeploymentConfig::default(), admin, MemoryStorage::new()).await?;
    let token = &deployment.token;
    println!(
        "  ✓ Token {} ({}) at {}",
        token.name(),
        token.symbol(),
        token.address()
    );
    println!("  ✓ Sale at {}", deployment.sale.address());
    println!(
        "  ✓ Price: {} ETH per token",
        format_units(deployment.sale.token_price(), Unit::Ether)
    );
    println!(
        "  ✓ Inventory: {} tokens\n",
        deployment.sale.tokens_available().await?
    );

    // 2. Buy tokens
    println!("💰 Buying tokens...");
    let price = deployment.sale.token_price();
    match deployment.sale.buy_tokens(buyer, 10, 10 * price - 1).await {
        Err(TokenError::IncorrectPayment { expected, received }) => {
            println!("  ✗ Rejected underpayment: expected {expected} wei, got {received}")
        }
        other => println!("  ? Unexpected outcome: {other:?}"),
    }

    let receipt = deployment.sale.buy_tokens(buyer, 10, 10 * price).await?;
    println!("  ✓ Bought 10 tokens (receipt {})", receipt.id);
    for event in &receipt.events {
        println!("    - {}: {:?}", event.name(), event);
    }

    // 3. Delegate spending to a friend
    println!("\n🤝 Delegated transfer...");
    deployment.token.approve(buyer, friend, 4).await?;
    deployment
        .token
        .transfer_from(friend, buyer, friend, 4)
        .await?;
    println!(
        "  ✓ Friend moved 4 tokens; buyer now holds {}",
        deployment.token.balance_of(&buyer).await?
    );

    // 4. Render what a client would show
    let snapshot = deployment.sale.snapshot(&buyer).await?;
    println!("\n📊 Sale progress:");
    println!("  Tokens sold:      {}", snapshot.tokens_sold);
    println!("  Tokens available: {}", snapshot.tokens_available);
    println!("  Progress:         {}%", snapshot.progress_display);

    // 5. End the sale
    println!("\n🏁 Ending the sale...");
    if let Err(e) = deployment.sale.end_sale(buyer).await {
        println!("  ✗ Buyer cannot end the sale: {e}");
    }
    let summary = deployment.sale.end_sale(admin).await?;
    println!(
        "  ✓ Returned {} tokens and {} ETH to the admin",
        summary.tokens_returned,
        format_units(summary.funds_released, Unit::Ether)
    );

    let report = deployment.token.check_conservation().await?;
    println!(
        "\n🔍 Supply conserved: {}",
        if report.is_conserved { "✅ Yes" } else { "❌ No" }
    );

    println!("\n🎉 Example completed successfully!");
    Ok(())
}

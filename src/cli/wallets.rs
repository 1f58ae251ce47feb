use super::ui;
use crate::core::tracker::WalletTracker;
use crate::core::wallet::{Wallet, WalletId};
use anyhow::Result;
use comfy_table::Cell;

pub fn display_wallets(wallets: &[Wallet]) -> String {
    if wallets.is_empty() {
        return ui::style_text("No wallets tracked.", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Label"),
        ui::header_cell("Address"),
        ui::header_cell("Added"),
    ]);
    for wallet in wallets {
        table.add_row(vec![
            Cell::new(wallet.id),
            Cell::new(wallet.label.as_deref().unwrap_or("-")),
            Cell::new(wallet.address.as_str()),
            Cell::new(wallet.created_at.format("%Y-%m-%d")),
        ]);
    }
    table.to_string()
}

pub fn list(tracker: &WalletTracker) -> Result<()> {
    println!("{}", display_wallets(tracker.wallets()));
    Ok(())
}

pub async fn track(tracker: &mut WalletTracker, address: &str, label: Option<String>) -> Result<()> {
    let wallet = tracker.track(address, label).await?;
    println!(
        "Tracking {} as wallet #{}",
        ui::style_text(&wallet.display_name(), ui::StyleType::TotalLabel),
        wallet.id
    );
    Ok(())
}

pub async fn untrack(tracker: &mut WalletTracker, id: WalletId) -> Result<()> {
    tracker.untrack(id).await?;
    println!("Stopped tracking wallet #{id}");
    Ok(())
}

pub async fn rename(tracker: &mut WalletTracker, id: WalletId, label: Option<String>) -> Result<()> {
    tracker.rename(id, label).await?;
    println!("Renamed wallet #{id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wallet::Address;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_display_wallets() {
        let wallets = vec![
            Wallet {
                id: 1,
                owner: "alice".to_string(),
                address: Address::parse(&format!("0x{:040x}", 0xabc)).unwrap(),
                label: Some("Main".to_string()),
                resolved_name: None,
                created_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
                holdings: Vec::new(),
            },
            Wallet {
                id: 4,
                owner: "alice".to_string(),
                address: Address::parse(&format!("0x{:040x}", 0xdef)).unwrap(),
                label: None,
                resolved_name: None,
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
                holdings: Vec::new(),
            },
        ];

        let output = display_wallets(&wallets);
        assert!(output.contains("Main"));
        assert!(output.contains(&format!("0x{:040x}", 0xabc)));
        assert!(output.contains("2024-03-09"));
        assert!(output.contains("2024-05-01"));
    }

    #[test]
    fn test_display_no_wallets() {
        assert!(display_wallets(&[]).contains("No wallets tracked"));
    }
}

//! Message templates (Bahasa Indonesia)

use rust_decimal::Decimal;

/// `150000` -> `Rp150.000`
pub fn rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}

pub fn payment_confirmed(order_number: &str, total: i64) -> String {
    format!(
        "Pembayaran pesanan *{order_number}* sebesar {} telah kami terima. \
         Pesanan sedang dikemas oleh peternak.\n\nTerima kasih telah berbelanja di EcoMaggie!",
        rupiah(total)
    )
}

pub fn new_paid_order(order_number: &str, total: i64) -> String {
    format!(
        "Pesanan baru *{order_number}* ({}) sudah dibayar. \
         Silakan kemas dan kirim pesanan melalui dashboard EcoMaggie.",
        rupiah(total)
    )
}

pub fn order_shipped(order_number: &str, courier: Option<&str>, waybill_id: Option<&str>) -> String {
    let mut msg = format!("Pesanan *{order_number}* sedang dalam pengiriman.");
    if let Some(c) = courier {
        msg.push_str(&format!("\nKurir: {}", c.to_uppercase()));
    }
    if let Some(w) = waybill_id {
        msg.push_str(&format!("\nNo. resi: {w}"));
    }
    msg
}

pub fn order_completed(order_number: &str) -> String {
    format!("Pesanan *{order_number}* telah diterima pembeli dan dinyatakan selesai.")
}

pub fn order_cancelled(order_number: &str, reason: &str) -> String {
    format!("Pesanan *{order_number}* dibatalkan ({reason}).")
}

pub fn paid_after_cancel(order_number: &str, total: i64) -> String {
    format!(
        "Pembayaran sebesar {} untuk pesanan *{order_number}* kami terima, \
         tetapi pesanan tersebut sudah dibatalkan. Tim EcoMaggie akan memproses pengembalian dana Anda.",
        rupiah(total)
    )
}

pub fn supply_accepted(waste_type: &str, weight_kg: Decimal, farmer_name: &str) -> String {
    format!(
        "Permintaan penjemputan {waste_type} ({} kg) diterima oleh {farmer_name}. \
         Peternak akan menghubungi Anda untuk penjemputan.",
        weight_kg.normalize()
    )
}

pub fn supply_rejected(waste_type: &str, weight_kg: Decimal) -> String {
    format!(
        "Maaf, permintaan penjemputan {waste_type} ({} kg) belum dapat diproses peternak.",
        weight_kg.normalize()
    )
}

pub fn supply_completed(waste_type: &str, weight_kg: Decimal) -> String {
    format!(
        "Sampah {waste_type} ({} kg) telah dijemput. Terima kasih telah mendukung pengelolaan sampah organik!",
        weight_kg.normalize()
    )
}

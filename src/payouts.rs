use crate::types::{Player, HONEY_POT_DEFAULT_THRESHOLD};

use serde::{Deserialize, Serialize};

pub const PLACE_LABELS: [&str; 6] = [
  "1st place",
  "2nd place",
  "3rd place",
  "4th place",
  "5th place",
  "6th place",
];

// ── Configuration ──────────────────────────────────────────────────────

/// Payout knobs as entered by the operator. Zero means "not set" for
/// every money field; fixed amounts override the percentage lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayoutConfig {
  pub entry_fee: f64,
  /// When positive, wins over entry fee x paid players.
  pub manual_pot: f64,
  pub mystery_out_percent: f64,
  pub place_percents: [f64; 6],
  pub team_out_percent: f64,
  pub mystery_out_fixed: f64,
  pub place_fixed: [f64; 6],
  pub team_out_fixed: f64,
  pub honey_pot_per_player: f64,
  pub honey_pot_threshold: u32,
}

impl Default for PayoutConfig {
  fn default() -> Self {
    PayoutConfig {
      entry_fee: 0.0,
      manual_pot: 0.0,
      mystery_out_percent: 0.0,
      place_percents: [0.0; 6],
      team_out_percent: 0.0,
      mystery_out_fixed: 0.0,
      place_fixed: [0.0; 6],
      team_out_fixed: 0.0,
      honey_pot_per_player: 0.0,
      honey_pot_threshold: HONEY_POT_DEFAULT_THRESHOLD,
    }
  }
}

// ── Breakdown ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PotSource {
  /// Operator typed the pot in directly.
  Manual,
  /// Entry fee x paid players.
  EntryFees,
  /// No usable pot; all amounts are zero.
  None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutLine {
  pub label: String,
  pub percent: Option<f64>,
  pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutBreakdown {
  pub lines: Vec<PayoutLine>,
  pub total_pot: f64,
  pub pot_source: PotSource,
  pub paid_players: usize,
  pub female_players: usize,
  /// Pot remaining for percentage lines after the Honey Pot carve-out.
  pub base_for_percent: f64,
  pub honey_pot_active: bool,
  pub honey_pot_amount: f64,
  /// Sum of all percentage fields; the UI warns when this is not 100.
  pub percent_sum: f64,
}

/// Pure payout arithmetic over the roster. Pot selection, Honey Pot
/// carve-out, percentage split, then fixed overrides, in that order.
pub fn calculate_payouts(players: &[Player], config: &PayoutConfig) -> PayoutBreakdown {
  let paid_players = players.iter().filter(|p| p.paid).count();
  let female_players = players
    .iter()
    .filter(|p| p.gender == crate::types::Gender::Female)
    .count();

  let (total_pot, pot_source) = if config.manual_pot > 0.0 {
    (config.manual_pot, PotSource::Manual)
  } else if config.entry_fee > 0.0 && paid_players > 0 {
    (config.entry_fee * paid_players as f64, PotSource::EntryFees)
  } else {
    (0.0, PotSource::None)
  };

  let percent_sum = config.mystery_out_percent
    + config.place_percents.iter().sum::<f64>()
    + config.team_out_percent;

  let honey_pot_active = female_players >= config.honey_pot_threshold as usize;
  let mut honey_pot_amount = if honey_pot_active && config.honey_pot_per_player > 0.0 {
    config.honey_pot_per_player * 2.0 // two players per team
  } else {
    0.0
  };

  let mut base_for_percent = total_pot;
  if honey_pot_amount > 0.0 && honey_pot_amount < base_for_percent {
    base_for_percent -= honey_pot_amount;
  } else if honey_pot_amount >= base_for_percent && total_pot > 0.0 {
    honey_pot_amount = total_pot;
    base_for_percent = 0.0;
  }

  let percent_amount = |percent: f64| -> f64 {
    if base_for_percent > 0.0 && percent_sum > 0.0 {
      base_for_percent / 100.0 * percent
    } else {
      0.0
    }
  };
  let with_override = |computed: f64, fixed: f64| -> f64 {
    if fixed > 0.0 {
      fixed
    } else {
      computed
    }
  };

  let mut lines = Vec::with_capacity(10);
  lines.push(PayoutLine {
    label: "Total Pot".to_string(),
    percent: None,
    amount: total_pot,
  });
  lines.push(PayoutLine {
    label: "Mystery Out".to_string(),
    percent: Some(config.mystery_out_percent),
    amount: with_override(
      percent_amount(config.mystery_out_percent),
      config.mystery_out_fixed,
    ),
  });
  for (i, label) in PLACE_LABELS.iter().enumerate() {
    lines.push(PayoutLine {
      label: (*label).to_string(),
      percent: Some(config.place_percents[i]),
      amount: with_override(
        percent_amount(config.place_percents[i]),
        config.place_fixed[i],
      ),
    });
  }
  lines.push(PayoutLine {
    label: "Team Out".to_string(),
    percent: Some(config.team_out_percent),
    amount: with_override(percent_amount(config.team_out_percent), config.team_out_fixed),
  });
  lines.push(PayoutLine {
    label: "Honey Pot (team)".to_string(),
    percent: None,
    amount: honey_pot_amount,
  });

  PayoutBreakdown {
    lines,
    total_pot,
    pot_source,
    paid_players,
    female_players,
    base_for_percent,
    honey_pot_active,
    honey_pot_amount,
    percent_sum,
  }
}

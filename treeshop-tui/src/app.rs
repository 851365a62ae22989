use treeshop_core::{
    model::{BusinessProfile, PackageTier, RateTable},
    session::{InputUpdate, PricingSession, TransportOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Quote,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuoteField {
    LandSize,
    Package,
    PostalCode,
    TransportHours,
    DebrisYards,
}

impl QuoteField {
    pub(crate) const ALL: [QuoteField; 5] = [
        QuoteField::LandSize,
        QuoteField::Package,
        QuoteField::PostalCode,
        QuoteField::TransportHours,
        QuoteField::DebrisYards,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            QuoteField::LandSize => "Land size (acres)",
            QuoteField::Package => "Package",
            QuoteField::PostalCode => "Project postal code",
            QuoteField::TransportHours => "Transport hours",
            QuoteField::DebrisYards => "Debris hauling (yards)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingField {
    TierRate(PackageTier),
    DebrisYield(PackageTier),
    TransportRate,
    DebrisRate,
    Markup,
    Deposit,
    BusinessName,
    BaseAddress,
    Phone,
    Email,
}

impl SettingField {
    pub(crate) fn all() -> Vec<SettingField> {
        let mut fields: Vec<SettingField> = PackageTier::ALL
            .into_iter()
            .map(SettingField::TierRate)
            .collect();
        fields.extend(PackageTier::MAX.into_iter().map(SettingField::DebrisYield));
        fields.extend([
            SettingField::TransportRate,
            SettingField::DebrisRate,
            SettingField::Markup,
            SettingField::Deposit,
            SettingField::BusinessName,
            SettingField::BaseAddress,
            SettingField::Phone,
            SettingField::Email,
        ]);
        fields
    }

    pub(crate) fn label(self) -> String {
        match self {
            SettingField::TierRate(tier) => format!("{tier} rate / acre"),
            SettingField::DebrisYield(tier) => format!("{tier} debris yards / acre"),
            SettingField::TransportRate => "Transport rate / hour".to_owned(),
            SettingField::DebrisRate => "Debris rate / yard".to_owned(),
            SettingField::Markup => "Final markup multiplier".to_owned(),
            SettingField::Deposit => "Deposit fraction (0-1)".to_owned(),
            SettingField::BusinessName => "Business name".to_owned(),
            SettingField::BaseAddress => "Base location address".to_owned(),
            SettingField::Phone => "Business phone".to_owned(),
            SettingField::Email => "Business email".to_owned(),
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            SettingField::BusinessName
                | SettingField::BaseAddress
                | SettingField::Phone
                | SettingField::Email
        )
    }
}

pub(crate) struct App {
    pub session: PricingSession,

    pub screen: Screen,
    pub quote_index: usize,
    pub settings_index: usize,
    pub settings_fields: Vec<SettingField>,

    /// Text being typed into the selected field, if an edit is open.
    pub editing: Option<String>,

    /// Settings edits staged until saved.
    pub draft_rates: RateTable,
    pub draft_profile: BusinessProfile,

    pub info_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(session: PricingSession) -> Self {
        let draft_rates = session.rates().clone();
        let draft_profile = session.profile().clone();
        Self {
            session,
            screen: Screen::Quote,
            quote_index: 0,
            settings_index: 0,
            settings_fields: SettingField::all(),
            editing: None,
            draft_rates,
            draft_profile,
            info_message: None,
            error_message: None,
        }
    }

    pub(crate) fn current_quote_field(&self) -> QuoteField {
        QuoteField::ALL
            .get(self.quote_index)
            .copied()
            .unwrap_or(QuoteField::LandSize)
    }

    pub(crate) fn current_setting_field(&self) -> Option<SettingField> {
        self.settings_fields.get(self.settings_index).copied()
    }

    pub(crate) fn open_settings(&mut self) {
        self.draft_rates = self.session.rates().clone();
        self.draft_profile = self.session.profile().clone();
        self.editing = None;
        self.screen = Screen::Settings;
    }

    pub(crate) fn clear_messages(&mut self) {
        self.info_message = None;
        self.error_message = None;
    }

    /// Current value of a quote field, as it would be edited.
    pub(crate) fn quote_value(&self, field: QuoteField) -> String {
        let inputs = self.session.inputs();
        match field {
            QuoteField::LandSize => inputs.land_size.to_string(),
            QuoteField::Package => inputs.tier.display_name().to_owned(),
            QuoteField::PostalCode => inputs.postal_code.clone(),
            QuoteField::TransportHours => inputs.transport_hours.to_string(),
            QuoteField::DebrisYards => inputs.debris_yards.to_string(),
        }
    }

    /// Current draft value of a settings field, as it would be edited.
    pub(crate) fn setting_value(&self, field: SettingField) -> String {
        let rates = &self.draft_rates;
        let profile = &self.draft_profile;
        match field {
            SettingField::TierRate(tier) => rates.base_rate(tier).to_string(),
            SettingField::DebrisYield(tier) => rates.debris_yield(tier).to_string(),
            SettingField::TransportRate => rates.transport_rate_per_hour.to_string(),
            SettingField::DebrisRate => rates.debris_rate_per_yard.to_string(),
            SettingField::Markup => rates.final_markup_multiplier.to_string(),
            SettingField::Deposit => rates.deposit_fraction.to_string(),
            SettingField::BusinessName => profile.name.clone(),
            SettingField::BaseAddress => profile.base_address.clone(),
            SettingField::Phone => profile.phone.clone(),
            SettingField::Email => profile.email.clone(),
        }
    }

    /// Apply the open edit buffer to the selected quote field.
    pub(crate) fn commit_quote_edit(&mut self) {
        let Some(text) = self.editing.take() else {
            return;
        };
        let field = self.current_quote_field();
        let Some(value) = self.parse_amount(&text) else {
            return;
        };
        let update = match field {
            QuoteField::LandSize => InputUpdate::LandSize(value),
            QuoteField::TransportHours => InputUpdate::TransportHours(value),
            QuoteField::DebrisYards => InputUpdate::DebrisYards(value),
            QuoteField::Package | QuoteField::PostalCode => return,
        };
        self.session.set_input(update);
    }

    /// Apply the open edit buffer to the selected settings draft field.
    pub(crate) fn commit_setting_edit(&mut self) {
        let Some(text) = self.editing.take() else {
            return;
        };
        let Some(field) = self.current_setting_field() else {
            return;
        };

        if field.is_text() {
            let text = text.trim().to_owned();
            let profile = &mut self.draft_profile;
            match field {
                SettingField::BusinessName => profile.name = text,
                SettingField::BaseAddress => profile.base_address = text,
                SettingField::Phone => profile.phone = text,
                SettingField::Email => profile.email = text,
                _ => {}
            }
            return;
        }

        let Some(value) = self.parse_amount(&text) else {
            return;
        };
        let rates = &mut self.draft_rates;
        match field {
            SettingField::TierRate(tier) => {
                rates.package_rates.insert(tier, value);
            }
            SettingField::DebrisYield(tier) => {
                rates.debris_yields.insert(tier, value);
            }
            SettingField::TransportRate => rates.transport_rate_per_hour = value,
            SettingField::DebrisRate => rates.debris_rate_per_yard = value,
            SettingField::Markup => rates.final_markup_multiplier = value,
            SettingField::Deposit => rates.deposit_fraction = value,
            _ => {}
        }
    }

    pub(crate) fn cycle_package(&mut self, forward: bool) {
        let tier = self.session.inputs().tier;
        let next = if forward { tier.next() } else { tier.previous() };
        self.session.set_input(InputUpdate::Tier(next));
    }

    /// Store a new postal code; a complete code may start an estimate.
    pub(crate) fn edit_postal_code(&mut self, code: String) {
        if self.session.update_postal_code(code) {
            self.info_message = Some("Estimating transport time…".to_owned());
        }
    }

    pub(crate) fn on_transport_outcome(&mut self, outcome: &TransportOutcome) {
        match &outcome.result {
            Ok(hours) => {
                self.error_message = None;
                self.info_message = Some(format!("Round trip estimated at {hours} h"));
            }
            Err(err) => {
                self.info_message = None;
                self.error_message = Some(format!(
                    "Transport estimate unavailable ({err}); enter hours manually"
                ));
            }
        }
    }

    fn parse_amount(&mut self, text: &str) -> Option<f64> {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
            _ => {
                self.error_message = Some(format!("{text:?} is not a non-negative number"));
                None
            }
        }
    }
}

use std::str::FromStr;

use bigdecimal::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub category: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub category: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.category.is_none()
            && self.active.is_none()
    }
}

const INITIAL_CATALOG: &[(&str, &str, &str, &str)] = &[
    ("Consulta Clínico Geral", "Consulta médica online com clínico geral", "120.00", "Consulta"),
    ("Consulta com Especialista", "Consulta médica online com especialista", "180.00", "Consulta"),
    ("Acompanhamento Contínuo", "Pacote de 3 consultas de acompanhamento", "300.00", "Consulta"),
    ("Exame de Sangue Completo", "Hemograma completo com coleta em domicílio", "89.90", "Exame"),
    ("Ressonância Magnética", "Ressonância magnética com laudo especializado", "450.00", "Exame"),
    ("Ultrassonografia", "Ultrassonografia com laudo médico", "180.00", "Exame"),
    ("Raio-X", "Raio-X com laudo médico", "120.00", "Exame"),
    ("Vacina Hepatite B", "Vacina contra Hepatite B", "85.00", "Vacina"),
    ("Vacina HPV", "Vacina contra HPV (3 doses)", "280.00", "Vacina"),
    ("Vacina Gripe", "Vacina contra Influenza", "65.00", "Vacina"),
    ("Vacina Tríplice Viral", "Vacina Tríplice Viral (Sarampo, Caxumba, Rubéola)", "95.00", "Vacina"),
    ("Massagem Relaxante", "Sessão de massagem relaxante 60 minutos", "120.00", "Bem-Estar"),
    ("Acupuntura", "Sessão de acupuntura com especialista", "150.00", "Bem-Estar"),
    ("RPG", "Sessão de RPG (Reeducação Postural Global)", "180.00", "Bem-Estar"),
    ("Peeling Facial", "Peeling facial com produtos profissionais", "200.00", "Bem-Estar"),
    ("Consulta Veterinária Online", "Consulta veterinária online 24h", "80.00", "Veterinário"),
    ("Vacina Pet", "Vacinação para cães e gatos", "65.00", "Veterinário"),
    ("Emergência Veterinária", "Atendimento de emergência 24h para pets", "150.00", "Veterinário"),
];

/// The launch catalog inserted into an empty store when seeding is enabled.
pub fn initial_catalog() -> Vec<NewProduct> {
    INITIAL_CATALOG
        .iter()
        .filter_map(|(name, description, price, category)| {
            Some(NewProduct {
                name: name.to_string(),
                description: description.to_string(),
                price: BigDecimal::from_str(price).ok()?,
                image_url: None,
                category: category.to_string(),
                active: true,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_catalog_prices_all_parse() {
        let catalog = initial_catalog();
        assert_eq!(catalog.len(), INITIAL_CATALOG.len());
        assert!(catalog.iter().all(|p| p.active));
    }
}

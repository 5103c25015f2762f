//! Landing copy, pricing plans and the user-facing notice catalogue.
//!
//! All copy lives here, keyed by [`Locale`]. Operations return typed errors;
//! the HTTP layer turns each outcome into exactly one [`Notice`].

use serde::{Deserialize, Serialize};

use crate::models::{PlanTier, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "pt-BR")]
    PtBr,
}

impl Locale {
    /// Parse a language tag. Unknown tags fall back to English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(',')
            .next()
            .unwrap_or("")
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if primary == "pt" || primary.starts_with("pt-") {
            Self::PtBr
        } else {
            Self::En
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::PtBr => "pt-BR",
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Plans
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub tier: PlanTier,
    pub name: &'static str,
    pub monthly_price_usd: u32,
    pub description: &'static str,
    /// Roster cap; `None` is unlimited.
    pub patient_limit: Option<u32>,
    pub features: &'static [&'static str],
    pub popular: bool,
}

pub fn plan(tier: PlanTier) -> Plan {
    match tier {
        PlanTier::Free => Plan {
            tier,
            name: "Free",
            monthly_price_usd: 0,
            description: "Perfect to get started",
            patient_limit: Some(5),
            features: &["Up to 5 patients", "Complete history", "Document upload", "Email support"],
            popular: false,
        },
        PlanTier::Pro => Plan {
            tier,
            name: "Pro",
            monthly_price_usd: 29,
            description: "For active professionals",
            patient_limit: Some(50),
            features: &[
                "Up to 50 patients",
                "Complete history",
                "Document upload",
                "Private notes",
                "Basic reports",
                "Priority support",
            ],
            popular: true,
        },
        PlanTier::Premium => Plan {
            tier,
            name: "Premium",
            monthly_price_usd: 79,
            description: "For larger practices",
            patient_limit: None,
            features: &[
                "Unlimited patients",
                "Complete history",
                "Document upload",
                "Private notes",
                "Advanced reports",
                "Data export",
                "Custom API",
                "24/7 support",
            ],
            popular: false,
        },
    }
}

pub fn plans() -> Vec<Plan> {
    PlanTier::all().iter().copied().map(plan).collect()
}

// ═══════════════════════════════════════════════════════════
// Notices
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Toast-style message shown after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    fn new(title: &str, description: impl Into<String>, variant: NoticeVariant) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            variant,
        }
    }
}

/// Catalogue keys for every user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    RecordAdded(RecordKind),
    RecordFailed(RecordKind),
    PatientAdded,
    PatientFailed,
    LimitReached,
    InvalidFileType,
    FileTooLarge,
    ProfileMissing,
    AccessClaimed,
    InvalidAccessLink,
    SignInRequired,
    AccessDenied,
    SignedIn,
    SignedUp,
    SignedOut,
    InvalidCredentials,
    EmailTaken,
    ExportReady,
    ExportFailed,
    Unexpected,
}

/// Title and default description for a message.
pub fn text(locale: Locale, message: Message) -> (&'static str, &'static str) {
    match locale {
        Locale::En => text_en(message),
        Locale::PtBr => text_pt_br(message),
    }
}

fn text_en(message: Message) -> (&'static str, &'static str) {
    use Message::*;
    match message {
        RecordAdded(RecordKind::Exam) => (
            "Exam added successfully!",
            "The exam has been saved to your medical history.",
        ),
        RecordAdded(RecordKind::Vaccine) => (
            "Vaccine added successfully!",
            "The vaccine has been saved to your vaccination card.",
        ),
        RecordAdded(RecordKind::Medication) => (
            "Medication added successfully!",
            "The medication has been saved to your medical history.",
        ),
        RecordAdded(RecordKind::History) => (
            "Entry added successfully!",
            "The entry has been saved to your medical history.",
        ),
        RecordFailed(RecordKind::Exam) => ("Error adding exam", "The exam could not be saved."),
        RecordFailed(RecordKind::Vaccine) => ("Error adding vaccine", "The vaccine could not be saved."),
        RecordFailed(RecordKind::Medication) => {
            ("Error adding medication", "The medication could not be saved.")
        }
        RecordFailed(RecordKind::History) => ("Error adding entry", "The entry could not be saved."),
        PatientAdded => (
            "Patient added successfully!",
            "Access link generated. Share with the patient.",
        ),
        PatientFailed => ("Error adding patient", "The patient could not be saved."),
        LimitReached => (
            "Limit reached",
            "You have reached the patient limit of your plan. Upgrade to add more patients.",
        ),
        InvalidFileType => (
            "Invalid file type",
            "Please upload PDF, JPG, JPEG, or PNG files only.",
        ),
        FileTooLarge => ("File too large", "Please upload files smaller than 5MB."),
        ProfileMissing => ("Profile not found", "Complete your profile before adding records."),
        AccessClaimed => (
            "Access linked",
            "Your professional can now follow your records.",
        ),
        InvalidAccessLink => ("Invalid access link", "This access link is not valid."),
        SignInRequired => ("Authentication Required", "Please sign in to access this page."),
        AccessDenied => ("Access Denied", "You don't have permission to access this page."),
        SignedIn => ("Welcome back!", "You have signed in successfully."),
        SignedUp => ("Account created!", "Your account has been created successfully."),
        SignedOut => ("Signed out", "You have been signed out."),
        InvalidCredentials => ("Sign in failed", "Invalid email or password."),
        EmailTaken => ("Sign up failed", "An account with this email already exists."),
        ExportReady => ("Export complete", "Your medical history PDF is ready."),
        ExportFailed => ("Export failed", "There was an error generating the PDF. Please try again."),
        Unexpected => ("Something went wrong", "Please try again."),
    }
}

fn text_pt_br(message: Message) -> (&'static str, &'static str) {
    use Message::*;
    match message {
        RecordAdded(RecordKind::Exam) => (
            "Exame adicionado com sucesso!",
            "O exame foi salvo no seu histórico médico.",
        ),
        RecordAdded(RecordKind::Vaccine) => (
            "Vacina adicionada com sucesso!",
            "A vacina foi salva na sua carteira de vacinação.",
        ),
        RecordAdded(RecordKind::Medication) => (
            "Medicação adicionada com sucesso!",
            "A medicação foi salva no seu histórico médico.",
        ),
        RecordAdded(RecordKind::History) => (
            "Entrada adicionada com sucesso!",
            "A entrada foi salva no seu histórico médico.",
        ),
        RecordFailed(RecordKind::Exam) => ("Erro ao adicionar exame", "O exame não pôde ser salvo."),
        RecordFailed(RecordKind::Vaccine) => {
            ("Erro ao adicionar vacina", "A vacina não pôde ser salva.")
        }
        RecordFailed(RecordKind::Medication) => {
            ("Erro ao adicionar medicação", "A medicação não pôde ser salva.")
        }
        RecordFailed(RecordKind::History) => {
            ("Erro ao adicionar entrada", "A entrada não pôde ser salva.")
        }
        PatientAdded => (
            "Paciente adicionado com sucesso!",
            "Link de acesso gerado. Compartilhe com o paciente.",
        ),
        PatientFailed => ("Erro ao adicionar paciente", "O paciente não pôde ser salvo."),
        LimitReached => (
            "Limite atingido",
            "Você atingiu o limite de pacientes do seu plano. Faça upgrade para adicionar mais pacientes.",
        ),
        InvalidFileType => (
            "Tipo de arquivo inválido",
            "Envie apenas arquivos PDF, JPG, JPEG ou PNG.",
        ),
        FileTooLarge => ("Arquivo muito grande", "Envie arquivos menores que 5MB."),
        ProfileMissing => (
            "Perfil não encontrado",
            "Complete seu perfil antes de adicionar registros.",
        ),
        AccessClaimed => (
            "Acesso vinculado",
            "Seu profissional agora pode acompanhar seus registros.",
        ),
        InvalidAccessLink => ("Link de acesso inválido", "Este link de acesso não é válido."),
        SignInRequired => ("Autenticação necessária", "Entre para acessar esta página."),
        AccessDenied => ("Acesso negado", "Você não tem permissão para acessar esta página."),
        SignedIn => ("Bem-vindo de volta!", "Você entrou com sucesso."),
        SignedUp => ("Conta criada!", "Sua conta foi criada com sucesso."),
        SignedOut => ("Sessão encerrada", "Você saiu da sua conta."),
        InvalidCredentials => ("Falha ao entrar", "E-mail ou senha inválidos."),
        EmailTaken => ("Falha no cadastro", "Já existe uma conta com este e-mail."),
        ExportReady => ("Exportação concluída", "O PDF do seu histórico médico está pronto."),
        ExportFailed => (
            "Falha na exportação",
            "Ocorreu um erro ao gerar o PDF. Tente novamente.",
        ),
        Unexpected => ("Algo deu errado", "Tente novamente."),
    }
}

fn is_failure(message: Message) -> bool {
    !matches!(
        message,
        Message::RecordAdded(_)
            | Message::PatientAdded
            | Message::AccessClaimed
            | Message::SignedIn
            | Message::SignedUp
            | Message::SignedOut
            | Message::ExportReady
    )
}

/// Notice with the catalogue description.
pub fn notice(locale: Locale, message: Message) -> Notice {
    let (_, description) = text(locale, message);
    notice_with(locale, message, description)
}

/// Notice with the catalogue title and a caller-supplied description.
///
/// Insert failures carry the backend message verbatim this way.
pub fn notice_with(locale: Locale, message: Message, description: impl Into<String>) -> Notice {
    let (title, _) = text(locale, message);
    let variant = if is_failure(message) {
        NoticeVariant::Destructive
    } else {
        NoticeVariant::Default
    };
    Notice::new(title, description, variant)
}

// ═══════════════════════════════════════════════════════════
// Landing page
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stat {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Testimonial {
    pub name: &'static str,
    pub role: &'static str,
    pub location: &'static str,
    pub rating: u8,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LandingContent {
    pub locale: Locale,
    pub headline: &'static str,
    pub tagline: &'static str,
    pub call_to_action: &'static str,
    pub highlights: Vec<Highlight>,
    pub proof_heading: &'static str,
    pub proof_subheading: &'static str,
    pub stats: Vec<Stat>,
    pub testimonials: Vec<Testimonial>,
    pub plans: Vec<Plan>,
}

pub fn landing(locale: Locale) -> LandingContent {
    let (headline, tagline, call_to_action, highlights, proof_heading, proof_subheading) =
        match locale {
            Locale::En => (
                "Digital Medical Record",
                "Keep all your patients' history in one place. They enter their data, and you access it easily and professionally.",
                "Start for Free",
                ["Exams, vaccines, and medications", "Patient inputs, you review", "Data protected and organized"],
                "Trusted by Healthcare Professionals",
                "Join thousands of healthcare providers who trust our platform for secure patient data management",
            ),
            Locale::PtBr => (
                "Prontuário Digital",
                "Mantenha o histórico de todos os seus pacientes em um só lugar. Eles registram os dados e você acessa com facilidade e profissionalismo.",
                "Comece grátis",
                ["Exames, vacinas e medicações", "O paciente registra, você revisa", "Dados protegidos e organizados"],
                "A confiança de profissionais de saúde",
                "Junte-se a milhares de profissionais que confiam na nossa plataforma para gerenciar dados de pacientes com segurança",
            ),
        };

    LandingContent {
        locale,
        headline,
        tagline,
        call_to_action,
        highlights: highlights.into_iter().map(|title| Highlight { title }).collect(),
        proof_heading,
        proof_subheading,
        stats: vec![
            Stat { value: "10,000+", label: "Healthcare Providers" },
            Stat { value: "99.9%", label: "Data Security Uptime" },
            Stat { value: "HIPAA", label: "Compliant Platform" },
        ],
        testimonials: vec![
            Testimonial {
                name: "Dr. Sarah Martinez",
                role: "Family Medicine",
                location: "Austin, TX",
                rating: 5,
                text: "This platform has revolutionized how I manage patient records. The interface is intuitive and my patients love being able to upload their own documents.",
            },
            Testimonial {
                name: "Dr. Michael Chen",
                role: "Cardiology",
                location: "Seattle, WA",
                rating: 5,
                text: "Finally, a medical records system that works for both doctors and patients. The shared access feature has improved our workflow tremendously.",
            },
            Testimonial {
                name: "Dr. Emily Rodriguez",
                role: "Internal Medicine",
                location: "Miami, FL",
                rating: 5,
                text: "Security and ease of use - exactly what we needed. My patients are more engaged with their health data than ever before.",
            },
        ],
        plans: plans(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_from_accept_language() {
        assert_eq!(Locale::from_tag("pt-BR,pt;q=0.9,en;q=0.8"), Locale::PtBr);
        assert_eq!(Locale::from_tag("pt"), Locale::PtBr);
        assert_eq!(Locale::from_tag("en-US"), Locale::En);
        assert_eq!(Locale::from_tag("fr"), Locale::En);
        assert_eq!(Locale::from_tag(""), Locale::En);
    }

    #[test]
    fn free_plan_caps_at_five() {
        assert_eq!(plan(PlanTier::Free).patient_limit, Some(5));
        assert_eq!(plan(PlanTier::Pro).patient_limit, Some(50));
        assert_eq!(plan(PlanTier::Premium).patient_limit, None);
    }

    #[test]
    fn plans_listed_in_tier_order() {
        let names: Vec<_> = plans().iter().map(|p| p.name).collect();
        assert_eq!(names, ["Free", "Pro", "Premium"]);
        assert_eq!(plans().iter().filter(|p| p.popular).count(), 1);
    }

    #[test]
    fn success_notices_use_default_variant() {
        let n = notice(Locale::En, Message::RecordAdded(RecordKind::Exam));
        assert_eq!(n.title, "Exam added successfully!");
        assert_eq!(n.variant, NoticeVariant::Default);
    }

    #[test]
    fn failure_notice_keeps_supplied_description() {
        let n = notice_with(
            Locale::PtBr,
            Message::RecordFailed(RecordKind::Medication),
            "CHECK constraint failed",
        );
        assert_eq!(n.title, "Erro ao adicionar medicação");
        assert_eq!(n.description, "CHECK constraint failed");
        assert_eq!(n.variant, NoticeVariant::Destructive);
    }

    #[test]
    fn every_record_kind_has_both_notices_in_both_locales() {
        for locale in [Locale::En, Locale::PtBr] {
            for kind in RecordKind::all() {
                let (added, _) = text(locale, Message::RecordAdded(*kind));
                let (failed, _) = text(locale, Message::RecordFailed(*kind));
                assert!(!added.is_empty());
                assert_ne!(added, failed);
            }
        }
    }

    #[test]
    fn landing_copy_localized() {
        assert_eq!(landing(Locale::PtBr).headline, "Prontuário Digital");
        assert_eq!(landing(Locale::En).highlights.len(), 3);
        assert_eq!(landing(Locale::En).plans.len(), 3);
    }
}

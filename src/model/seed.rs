use crate::model::{
    admin::Admin,
    candidate::{Candidate, Category},
};

/// Records every fresh installation starts with. Persisted data takes
/// precedence over these on ID/email collision.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub candidates: Vec<Candidate>,
    pub admins: Vec<Admin>,
}

impl Seed {
    /// Three candidates per office and the `admin@demo.com` account.
    pub fn demo() -> Self {
        Self {
            candidates: vec![
                seed_candidate(
                    "p1",
                    "María Fernández",
                    "Partido Progreso Nacional",
                    "Abogada con 15 años de experiencia en políticas públicas. Propone modernización del estado y transparencia total.",
                    "https://images.unsplash.com/photo-1573496359142-b8d87734a5a2?w=400&h=400&fit=crop",
                    Category::Presidencia,
                ),
                seed_candidate(
                    "p2",
                    "Carlos Rodríguez",
                    "Alianza Democrática",
                    "Economista dedicado a la reducción de la desigualdad. Enfoque en educación y salud universal.",
                    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=400&fit=crop",
                    Category::Presidencia,
                ),
                seed_candidate(
                    "p3",
                    "Ana Martínez",
                    "Unión por el Cambio",
                    "Ingeniera y empresaria. Promueve innovación tecnológica y desarrollo sostenible.",
                    "https://images.unsplash.com/photo-1580489944761-15a19d654956?w=400&h=400&fit=crop",
                    Category::Presidencia,
                ),
                seed_candidate(
                    "a1",
                    "José García",
                    "Movimiento Ciudadano",
                    "Ex-concejal con experiencia en gestión municipal. Prioriza infraestructura y seguridad.",
                    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=400&h=400&fit=crop",
                    Category::Alcaldia,
                ),
                seed_candidate(
                    "a2",
                    "Laura Sánchez",
                    "Juntos por la Ciudad",
                    "Activista comunitaria. Enfoque en espacios verdes y transporte público eficiente.",
                    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=400&h=400&fit=crop",
                    Category::Alcaldia,
                ),
                seed_candidate(
                    "a3",
                    "Roberto Díaz",
                    "Frente Renovador",
                    "Arquitecto urbanista. Propone transformación digital y modernización de servicios.",
                    "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=400&h=400&fit=crop",
                    Category::Alcaldia,
                ),
            ],
            admins: vec![Admin {
                name: "Admin Demo".to_string(),
                email: "admin@demo.com".to_string(),
                password: "Demo123!".to_string(),
            }],
        }
    }
}

fn seed_candidate(
    id: &str,
    name: &str,
    party: &str,
    description: &str,
    image: &str,
    category: Category,
) -> Candidate {
    Candidate {
        id: id.to_string(),
        name: name.to_string(),
        party: party.to_string(),
        description: description.to_string(),
        image: image.to_string(),
        category,
        votes: 0,
    }
}

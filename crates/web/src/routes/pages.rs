//! Static content pages: home, about and tips.

use axum::Json;
use serde::Serialize;

/// A link rendered as a button.
#[derive(Debug, Serialize)]
pub struct CallToAction {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub headline: &'static str,
    pub tagline: &'static str,
    pub call_to_action: CallToAction,
}

/// A titled paragraph.
#[derive(Debug, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AboutPage {
    pub title: &'static str,
    pub intro: &'static str,
    pub mission: Section,
    pub vision: Section,
    pub values: &'static [Section],
}

/// Examples of items accepted for one material.
#[derive(Debug, Serialize)]
pub struct MaterialGuide {
    pub name: &'static str,
    pub items: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct TipsPage {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub tips: &'static [Section],
    pub materials: &'static [MaterialGuide],
    pub benefits: &'static [Section],
}

const VALUES: &[Section] = &[
    Section {
        title: "Sustentabilidade",
        text: "Compromisso com práticas que preservam o meio ambiente para as futuras gerações",
    },
    Section {
        title: "Transparência",
        text: "Comunicação clara e honesta com todos os usuários da plataforma",
    },
    Section {
        title: "Colaboração",
        text: "Acreditamos no poder da união entre pessoas e agentes de reciclagem",
    },
    Section {
        title: "Acessibilidade",
        text: "Tornar a reciclagem simples e acessível para todos, sem barreiras",
    },
    Section {
        title: "Inovação",
        text: "Buscar constantemente novas formas de melhorar o processo de reciclagem",
    },
    Section {
        title: "Responsabilidade",
        text: "Compromisso com o impacto positivo em nossa comunidade e no planeta",
    },
];

const TIPS: &[Section] = &[
    Section {
        title: "Separação Correta de Materiais",
        text: "Separe o lixo reciclável (papel, plástico, vidro, metal) do lixo orgânico. \
               Lave e seque os materiais recicláveis antes de descartar.",
    },
    Section {
        title: "Reduza o Consumo de Plástico",
        text: "Use sacolas reutilizáveis, garrafas de água e evite produtos com embalagens \
               plásticas excessivas. Pequenas mudanças fazem grande diferença.",
    },
    Section {
        title: "Compostagem em Casa",
        text: "Transforme resíduos orgânicos em adubo rico em nutrientes. A compostagem \
               reduz o lixo e beneficia plantas e jardins.",
    },
    Section {
        title: "Reutilize e Doe",
        text: "Antes de descartar, pense em reutilizar ou doar itens em bom estado. \
               Roupas, móveis e eletrônicos podem ter uma segunda vida.",
    },
];

const MATERIALS: &[MaterialGuide] = &[
    MaterialGuide {
        name: "Papel e Papelão",
        items: &["Jornais e revistas", "Caixas de papelão", "Papel de escritório", "Cadernos"],
    },
    MaterialGuide {
        name: "Plástico",
        items: &["Garrafas PET", "Embalagens plásticas", "Sacolas plásticas", "Potes e tampas"],
    },
    MaterialGuide {
        name: "Vidro",
        items: &["Garrafas de vidro", "Potes de vidro", "Frascos de perfume", "Copos"],
    },
    MaterialGuide {
        name: "Metal",
        items: &["Latas de alumínio", "Latas de aço", "Tampas metálicas", "Arames"],
    },
];

const BENEFITS: &[Section] = &[
    Section {
        title: "Preserva o Meio Ambiente",
        text: "Reduz a poluição e preserva recursos naturais para as próximas gerações",
    },
    Section {
        title: "Economiza Energia",
        text: "Produzir materiais reciclados consome menos energia que a produção original",
    },
    Section {
        title: "Gera Empregos",
        text: "A indústria da reciclagem cria oportunidades de trabalho e renda",
    },
];

/// `GET /`
pub async fn home() -> Json<HomePage> {
    Json(HomePage {
        headline: "RECICLAR NUNCA FOI TÃO FÁCIL. CONECTE, RECICLE E FAÇA A DIFERENÇA",
        tagline: "Juntos, ajudamos o meio ambiente e fortalecemos a reciclagem",
        call_to_action: CallToAction {
            label: "QUERO RECICLAR",
            href: "/locais",
        },
    })
}

/// `GET /sobre`
pub async fn about() -> Json<AboutPage> {
    Json(AboutPage {
        title: "CLIQUE & RECICLE",
        intro: "Plataforma dedicada a conectar pessoas que desejam reciclar com agentes de \
                reciclagem, tornando o processo mais simples e acessível para todos.",
        mission: Section {
            title: "NOSSA MISSÃO",
            text: "Facilitar o acesso à reciclagem, conectando pessoas conscientes com agentes \
                   de reciclagem qualificados. Queremos tornar a reciclagem um hábito simples e \
                   acessível para todos, contribuindo para um planeta mais sustentável e limpo.",
        },
        vision: Section {
            title: "NOSSA VISÃO",
            text: "Ser a principal plataforma de reciclagem do Brasil, reconhecida por facilitar \
                   a conexão entre recicladores e agentes, promovendo uma economia circular e \
                   contribuindo significativamente para a preservação ambiental.",
        },
        values: VALUES,
    })
}

/// `GET /dicas`
pub async fn tips() -> Json<TipsPage> {
    Json(TipsPage {
        title: "DICAS & CONTEÚDO",
        subtitle: "Aprenda mais sobre reciclagem e descubra como fazer a diferença no dia a dia",
        tips: TIPS,
        materials: MATERIALS,
        benefits: BENEFITS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tips_cover_four_materials() {
        let Json(page) = tips().await;
        assert_eq!(page.tips.len(), 4);
        let names: Vec<_> = page.materials.iter().map(|m| m.name).collect();
        assert_eq!(names, ["Papel e Papelão", "Plástico", "Vidro", "Metal"]);
    }

    #[tokio::test]
    async fn test_home_points_to_list() {
        let Json(page) = home().await;
        assert_eq!(page.call_to_action.href, "/locais");
    }
}

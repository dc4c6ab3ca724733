//! Category dictionary and keyword scoring.
//!
//! The dictionary is an ordered slice: iteration order is insertion order,
//! which is the documented tie-break for equal scores. All keywords are
//! compiled into a single Aho-Corasick automaton at startup; matches are
//! verified against word boundaries so "ion" never fires inside "station".

use aho_corasick::AhoCorasick;

/// Category name → keyword list, in priority order.
pub static CATEGORIES: &[(&str, &[&str])] = &[
    // Finance & accounting
    ("Financial Documents", &[
        "revenue", "profit", "loss", "balance sheet", "income statement", "cash flow",
        "expense", "budget", "financial", "accounting", "audit", "tax", "fiscal", "earnings",
        "asset", "liability", "equity", "ledger", "invoice", "payroll", "dividend",
        "depreciation", "amortization", "reconciliation", "accounts receivable",
        "accounts payable", "general ledger", "cost of goods", "gross margin",
    ]),
    ("Investment Documents", &[
        "investment", "portfolio", "stock", "bond", "mutual fund", "etf", "dividend",
        "yield", "return", "risk", "diversification", "allocation", "hedge fund",
        "private equity", "securities", "derivatives", "options", "futures", "commodities",
        "forex", "cryptocurrency", "ipo", "prospectus", "shareholder", "market cap",
        "blue chip", "index fund",
    ]),
    ("Banking Documents", &[
        "bank", "deposit", "withdrawal", "savings", "checking", "loan", "credit", "debit",
        "interest rate", "mortgage", "refinance", "overdraft", "wire transfer", "ach",
        "swift", "statement", "balance", "routing number", "escrow", "underwriting",
    ]),
    ("Insurance Documents", &[
        "insurance", "policy", "premium", "deductible", "claim", "coverage", "underwriter",
        "actuary", "beneficiary", "annuity", "indemnity", "liability insurance",
        "life insurance", "health insurance", "auto insurance", "homeowner insurance",
        "reinsurance", "rider",
    ]),
    ("Tax Documents", &[
        "tax return", "w2", "1099", "tax deduction", "taxable income", "irs", "withholding",
        "capital gains", "tax bracket", "filing", "tax credit", "estimated tax",
        "self employment tax", "sales tax", "property tax", "estate tax", "tax exempt",
        "tax audit",
    ]),
    // Business & strategy
    ("Startup Documents", &[
        "startup", "pitch", "venture", "funding", "investor", "seed", "series a",
        "series b", "valuation", "cap table", "equity stake", "term sheet",
        "convertible note", "runway", "burn rate", "mvp", "product market fit", "traction",
        "growth hacking", "unicorn", "incubator", "accelerator", "angel investor",
        "bootstrapping",
    ]),
    ("Business Strategy", &[
        "strategy", "planning", "roadmap", "objective", "kpi", "metric",
        "competitive analysis", "market research", "swot", "business model",
        "go to market", "positioning", "differentiation", "value proposition",
        "stakeholder", "milestone", "deliverable", "business plan", "mission statement",
        "vision statement", "okr", "balanced scorecard",
    ]),
    ("Marketing", &[
        "marketing", "branding", "advertising", "campaign", "social media",
        "content marketing", "seo", "sem", "email marketing", "analytics", "conversion",
        "lead generation", "customer acquisition", "retention", "engagement", "reach",
        "impression", "click through rate", "influencer", "affiliate marketing",
        "remarketing", "copywriting", "brand awareness", "market segmentation",
        "target audience",
    ]),
    ("Sales Documents", &[
        "sales", "quota", "pipeline", "crm", "deal", "proposal", "prospect", "lead",
        "close", "upsell", "cross sell", "commission", "territory", "account management",
        "sales forecast", "cold call", "demo", "price quote", "rfp", "rfq", "tender",
        "bid",
    ]),
    ("E-commerce", &[
        "ecommerce", "online store", "shopping cart", "checkout", "payment gateway",
        "product listing", "inventory", "sku", "fulfillment", "shipping", "dropshipping",
        "marketplace", "shopify", "woocommerce", "amazon", "customer review",
        "return policy", "order tracking",
    ]),
    ("Supply Chain and Logistics", &[
        "supply chain", "logistics", "warehouse", "inventory management", "procurement",
        "vendor", "supplier", "distribution", "freight", "shipping", "tracking", "barcode",
        "last mile", "cold chain", "just in time", "lean manufacturing", "bill of lading",
        "customs",
    ]),
    // Legal
    ("Legal Documents", &[
        "contract", "agreement", "legal", "compliance", "regulation", "terms",
        "conditions", "liability", "clause", "amendment", "litigation", "lawsuit",
        "settlement", "attorney", "counsel", "jurisdiction", "statute", "ordinance",
        "intellectual property", "patent", "trademark", "copyright", "nda",
        "confidentiality", "arbitration", "mediation", "injunction", "deposition",
        "affidavit",
    ]),
    ("Agreements", &[
        "agreement", "memorandum", "understanding", "partnership", "collaboration",
        "joint venture", "service level agreement", "master service agreement",
        "statement of work", "addendum", "licensing agreement", "franchise agreement",
        "non compete", "non solicitation", "distribution agreement",
    ]),
    ("Regulatory and Compliance", &[
        "compliance", "regulatory", "gdpr", "hipaa", "sox", "pci", "ferpa", "ccpa",
        "data protection", "privacy policy", "consent", "breach notification",
        "audit trail", "whistleblower", "anti money laundering", "know your customer",
        "sanctions",
    ]),
    // Healthcare & medicine
    ("Medical Records", &[
        "patient", "diagnosis", "treatment", "prescription", "medical", "clinical",
        "hospital", "doctor", "physician", "nurse", "surgery", "therapy", "medication",
        "symptom", "disease", "condition", "health record", "radiology", "laboratory",
        "pathology", "ehr", "emr", "icd", "cpt", "referral", "discharge summary",
    ]),
    ("Health Research", &[
        "epidemiology", "clinical trial", "vaccine", "drug", "pharmaceutical",
        "immunology", "oncology", "cardiology", "neurology", "public health",
        "biomedical", "genomics", "proteomics", "medical research",
        "randomized controlled trial", "placebo", "cohort study", "meta analysis",
    ]),
    ("Mental Health", &[
        "psychology", "psychiatry", "therapy", "counseling", "mental health", "anxiety",
        "depression", "ptsd", "cognitive behavioral", "mindfulness", "psychotherapy",
        "bipolar", "schizophrenia", "adhd", "autism", "behavioral health",
        "substance abuse", "addiction", "rehabilitation",
    ]),
    ("Dental Records", &[
        "dental", "dentist", "orthodontics", "periodontal", "cavity", "filling", "crown",
        "root canal", "extraction", "implant", "braces", "oral hygiene", "gingivitis",
        "fluoride", "dental x ray",
    ]),
    ("Veterinary Documents", &[
        "veterinary", "animal", "pet", "vaccination", "spay", "neuter", "kennel",
        "livestock", "equine", "canine", "feline", "animal health", "rabies", "heartworm",
        "microchip", "breeder",
    ]),
    ("Pharmacy Documents", &[
        "pharmacy", "pharmacist", "dispensing", "formulary", "dosage", "side effects",
        "drug interaction", "generic", "brand name", "controlled substance",
        "compounding", "over the counter",
    ]),
    // Science & research
    ("Physics Research", &[
        "physics", "quantum", "particle", "mechanics", "force", "velocity",
        "acceleration", "energy", "momentum", "thermodynamics", "entropy",
        "electromagnetic", "relativity", "newtonian", "gravitational", "wave function",
        "schrodinger", "quantum mechanics", "field theory", "cosmology", "astrophysics",
        "nuclear physics", "optics", "photon", "higgs boson", "standard model",
        "string theory", "dark matter",
    ]),
    ("Biology Research", &[
        "biology", "cell", "dna", "rna", "gene", "protein", "organism", "evolution",
        "natural selection", "ecology", "ecosystem", "species", "mitosis", "meiosis",
        "chromosome", "genetics", "heredity", "mutation", "adaptation", "taxonomy",
        "anatomy", "physiology", "molecular biology", "biochemistry", "microbiology",
        "botany", "zoology", "crispr", "gene editing", "cloning", "stem cell",
        "bioinformatics",
    ]),
    ("Chemistry Research", &[
        "chemistry", "molecule", "atom", "element", "compound", "reaction", "chemical",
        "organic chemistry", "inorganic chemistry", "physical chemistry", "biochemistry",
        "analytical chemistry", "synthesis", "catalyst", "polymer", "periodic table",
        "bond", "ion", "acid", "base", "ph", "titration", "spectroscopy",
        "chromatography", "electrochemistry",
    ]),
    ("Mathematics", &[
        "mathematics", "algebra", "calculus", "geometry", "trigonometry",
        "linear algebra", "differential equation", "integral", "derivative",
        "probability", "statistics", "theorem", "proof", "conjecture", "topology",
        "number theory", "combinatorics", "graph theory", "matrix", "vector",
        "eigenvalue", "fourier", "laplace",
    ]),
    ("Astronomy and Space", &[
        "astronomy", "telescope", "planet", "star", "galaxy", "nebula", "solar system",
        "orbit", "satellite", "space exploration", "nasa", "esa", "rocket", "spacecraft",
        "mars", "moon", "asteroid", "black hole", "supernova", "exoplanet", "hubble",
        "james webb",
    ]),
    ("Earth Science and Geology", &[
        "geology", "rock", "mineral", "fossil", "tectonic", "earthquake", "volcano",
        "sedimentary", "metamorphic", "igneous", "stratigraphy", "geomorphology",
        "paleontology", "seismology", "continental drift", "plate tectonics", "erosion",
        "weathering", "geological survey",
    ]),
    ("Environmental Science", &[
        "environment", "climate change", "global warming", "carbon emission",
        "sustainability", "renewable energy", "pollution", "biodiversity",
        "conservation", "deforestation", "ozone", "greenhouse gas",
        "ecosystem restoration", "recycling", "waste management", "carbon footprint",
        "environmental impact", "clean energy", "solar power", "wind energy",
        "hydroelectric", "geothermal",
    ]),
    ("Oceanography and Marine Science", &[
        "ocean", "marine", "coral reef", "deep sea", "tidal", "current", "salinity",
        "plankton", "marine biology", "oceanography", "submarine", "continental shelf",
        "sea level", "tsunami", "aquaculture", "fisheries", "mangrove", "estuary",
    ]),
    ("Meteorology and Weather", &[
        "weather", "forecast", "temperature", "precipitation", "humidity", "barometer",
        "wind speed", "hurricane", "tornado", "cyclone", "meteorology", "climate",
        "drought", "flood", "monsoon", "el nino", "la nina", "jet stream", "radar",
        "satellite imagery",
    ]),
    ("General Scientific Research", &[
        "research", "experiment", "hypothesis", "methodology", "results", "conclusion",
        "abstract", "introduction", "literature review", "discussion", "peer review",
        "publication", "journal", "citation", "scientific method", "observation",
        "measurement", "analysis",
    ]),
    // Technology & engineering
    ("Software Engineering", &[
        "code", "programming", "software", "development", "api", "framework", "library",
        "architecture", "design pattern", "algorithm", "debugging", "testing",
        "deployment", "devops", "continuous integration", "version control", "git",
        "docker", "kubernetes", "microservices", "backend", "frontend",
        "agile development", "sprint", "pull request", "code review", "refactoring",
    ]),
    ("AI Research", &[
        "artificial intelligence", "machine learning", "deep learning", "neural network",
        "transformer", "lstm", "cnn", "gan", "reinforcement learning", "nlp",
        "computer vision", "model training", "dataset", "feature engineering",
        "optimization", "gradient descent", "backpropagation", "overfitting",
        "regularization", "attention mechanism", "embedding", "llm", "generative ai",
        "diffusion model", "fine tuning", "prompt engineering",
    ]),
    ("Data Science", &[
        "data analysis", "statistics", "regression", "classification", "clustering",
        "visualization", "pandas", "numpy", "matplotlib", "jupyter",
        "exploratory data analysis", "feature selection", "dimensionality reduction",
        "time series", "forecasting", "hypothesis testing", "correlation",
        "data pipeline", "data warehouse", "etl", "data lake",
    ]),
    ("Cybersecurity", &[
        "security", "encryption", "authentication", "authorization", "vulnerability",
        "penetration testing", "firewall", "malware", "phishing", "ransomware",
        "cryptography", "ssl", "tls", "vpn", "intrusion detection", "threat", "exploit",
        "patch", "compliance", "zero trust", "soc", "siem", "incident response",
        "forensics",
    ]),
    ("Web Development", &[
        "html", "css", "javascript", "react", "angular", "vue", "typescript", "webpack",
        "responsive design", "dom", "ajax", "rest api", "graphql", "web application",
        "spa", "pwa", "tailwind", "bootstrap", "next js", "node js", "express",
    ]),
    ("Mobile Development", &[
        "android", "ios", "swift", "kotlin", "flutter", "react native", "mobile app",
        "xcode", "gradle", "app store", "play store", "push notification", "geolocation",
        "responsive", "touch", "cordova", "xamarin", "mobile ui", "mobile testing",
    ]),
    ("Cloud Computing", &[
        "cloud", "aws", "azure", "gcp", "serverless", "lambda", "ec2", "s3", "iaas",
        "paas", "saas", "load balancer", "auto scaling", "cloud formation", "terraform",
        "ansible", "container", "virtual machine", "cdn", "cloud migration",
    ]),
    ("Database Administration", &[
        "database", "sql", "nosql", "mongodb", "postgresql", "mysql", "redis",
        "elasticsearch", "schema", "query", "index", "table", "join", "normalization",
        "replication", "sharding", "backup", "migration", "stored procedure",
        "transaction", "acid",
    ]),
    ("Networking and IT Infrastructure", &[
        "network", "router", "switch", "tcp", "udp", "dns", "dhcp", "ip address",
        "subnet", "bandwidth", "latency", "firewall", "proxy", "nat", "vlan", "mpls",
        "bgp", "ospf", "active directory", "ldap", "server", "rack", "data center",
    ]),
    ("Game Development", &[
        "game", "unity", "unreal engine", "godot", "sprite", "shader", "physics engine",
        "collision detection", "game loop", "rendering", "texture", "mesh", "animation",
        "pathfinding", "level design", "game design", "multiplayer", "fps", "rpg",
        "procedural generation",
    ]),
    ("Robotics", &[
        "robot", "robotics", "actuator", "sensor", "servo", "lidar", "autonomous",
        "kinematics", "path planning", "ros", "manipulator", "end effector",
        "computer vision", "slam", "inverse kinematics", "pid controller", "humanoid",
        "drone",
    ]),
    ("IoT and Embedded Systems", &[
        "iot", "internet of things", "embedded", "arduino", "raspberry pi",
        "microcontroller", "firmware", "sensor", "mqtt", "zigbee", "bluetooth", "wifi",
        "edge computing", "wearable", "smart home", "plc", "scada", "rtos", "gpio",
        "i2c", "spi",
    ]),
    ("Blockchain and Cryptocurrency", &[
        "blockchain", "bitcoin", "ethereum", "smart contract", "solidity", "token",
        "nft", "defi", "mining", "consensus", "proof of work", "proof of stake",
        "wallet", "decentralized", "dao", "web3", "dapp", "gas fee", "ledger", "hash",
    ]),
    ("DevOps and CI/CD", &[
        "devops", "ci cd", "jenkins", "github actions", "gitlab ci", "pipeline", "build",
        "release", "deployment", "monitoring", "grafana", "prometheus", "elk",
        "log aggregation", "artifact", "helm", "argocd", "infrastructure as code",
        "site reliability",
    ]),
    // Engineering (non-software)
    ("Mechanical Engineering", &[
        "mechanical", "cad", "solidworks", "autocad", "tolerance", "manufacturing",
        "cnc", "lathe", "milling", "welding", "thermodynamics", "fluid dynamics",
        "stress analysis", "fatigue", "gearbox", "bearing", "shaft", "turbine", "engine",
        "pump",
    ]),
    ("Electrical Engineering", &[
        "electrical", "circuit", "voltage", "current", "resistance", "capacitor",
        "inductor", "transistor", "diode", "pcb", "power supply", "amplifier",
        "oscillator", "signal processing", "control system", "plc", "motor", "generator",
        "transformer",
    ]),
    ("Civil Engineering", &[
        "civil engineering", "structural", "concrete", "steel", "bridge", "foundation",
        "geotechnical", "surveying", "hydrology", "drainage", "road design", "highway",
        "dam", "reinforcement", "load bearing", "building code", "seismic design",
        "soil mechanics",
    ]),
    ("Chemical Engineering", &[
        "chemical engineering", "process design", "reactor", "distillation",
        "heat exchanger", "mass transfer", "fluid flow", "piping", "process control",
        "batch process", "continuous process", "petrochemical", "refinery", "separation",
        "crystallization",
    ]),
    ("Aerospace Engineering", &[
        "aerospace", "aerodynamics", "propulsion", "avionics", "airframe", "thrust",
        "drag", "lift", "mach number", "wind tunnel", "flight control", "navigation",
        "orbit", "payload", "reentry", "composite material", "jet engine", "turbofan",
        "fuselage",
    ]),
    // Architecture & design
    ("Architecture and Building", &[
        "architecture", "blueprint", "floor plan", "elevation", "facade",
        "building design", "interior design", "landscape", "zoning", "building permit",
        "renovation", "construction", "architect", "structural plan", "site plan", "bim",
        "revit", "urban planning",
    ]),
    ("UX UI Design", &[
        "ux", "ui", "user experience", "user interface", "wireframe", "prototype",
        "mockup", "figma", "sketch", "adobe xd", "usability testing", "persona",
        "user journey", "information architecture", "interaction design",
        "accessibility", "responsive design", "design system",
    ]),
    ("Graphic Design", &[
        "graphic design", "photoshop", "illustrator", "indesign", "canva", "typography",
        "color theory", "layout", "composition", "logo", "brand identity", "vector",
        "raster", "print design", "poster", "brochure", "flyer", "infographic",
        "visual identity",
    ]),
    // Education & academia
    ("Academic Papers", &[
        "thesis", "dissertation", "paper", "publication", "journal", "conference",
        "proceedings", "abstract", "citation", "bibliography", "scholarly",
        "peer review", "academic", "university", "professor", "impact factor", "doi",
        "arxiv", "preprint",
    ]),
    ("Course Materials", &[
        "lecture", "course", "syllabus", "curriculum", "assignment", "homework", "exam",
        "quiz", "grade", "semester", "tutorial", "textbook", "slides", "notes",
        "study guide", "learning objective", "lesson plan", "module", "rubric",
        "assessment",
    ]),
    ("Training Materials", &[
        "training", "workshop", "certification", "onboarding", "e learning", "webinar",
        "tutorial", "skill development", "competency", "professional development",
        "continuing education", "accreditation", "learning management system", "lms",
        "scorm",
    ]),
    // Human resources & operations
    ("Human Resources", &[
        "hr", "employee", "recruitment", "hiring", "onboarding", "training",
        "performance review", "compensation", "benefits", "payroll", "termination",
        "resignation", "job description", "interview", "talent management", "workforce",
        "organizational culture", "diversity", "inclusion", "employee engagement",
        "retention",
    ]),
    ("Project Management", &[
        "project", "task", "timeline", "deadline", "gantt", "agile", "scrum", "sprint",
        "kanban", "backlog", "standup", "retrospective", "stakeholder",
        "resource allocation", "risk management", "scope", "deliverable", "milestone",
        "jira", "asana", "trello", "work breakdown structure", "critical path",
        "earned value",
    ]),
    ("Meeting Notes", &[
        "meeting", "minutes", "agenda", "discussion", "action item", "attendee",
        "summary", "notes", "follow up", "decision", "brainstorming", "workshop",
        "session", "conference call", "standup notes", "retrospective notes",
        "all hands",
    ]),
    ("Customer Support", &[
        "support", "ticket", "helpdesk", "customer service", "issue", "resolution",
        "escalation", "sla", "knowledge base", "faq", "chat support", "phone support",
        "email support", "zendesk", "freshdesk", "customer satisfaction", "csat", "nps",
    ]),
    // Real estate & property
    ("Real Estate", &[
        "property", "real estate", "lease", "rent", "mortgage", "deed", "title",
        "appraisal", "valuation", "zoning", "commercial property",
        "residential property", "listing", "broker", "agent", "escrow", "closing",
        "inspection", "landlord", "tenant", "condominium", "townhouse", "foreclosure",
        "mls",
    ]),
    ("Construction Documents", &[
        "construction", "contractor", "subcontractor", "building permit", "inspection",
        "blueprint", "estimate", "bid", "change order", "punch list",
        "certificate of occupancy", "general contractor", "safety plan", "osha",
        "scaffolding", "excavation", "grading",
    ]),
    // Government & public sector
    ("Government Documents", &[
        "government", "policy", "legislation", "regulation", "federal", "state",
        "municipal", "public sector", "administration", "ministry", "department",
        "agency", "bureaucracy", "civil service", "public policy", "governance",
        "constitution", "parliament", "congress", "executive order", "proclamation",
        "ordinance", "statute",
    ]),
    ("Military and Defense", &[
        "military", "defense", "army", "navy", "air force", "marine", "intelligence",
        "classified", "security clearance", "deployment", "battalion", "regiment",
        "operations", "strategy", "logistics", "reconnaissance", "surveillance",
        "weapons system", "nato",
    ]),
    // Personal & lifestyle
    ("Personal Documents", &[
        "personal", "diary", "journal", "letter", "correspondence", "resume", "cv",
        "cover letter", "recommendation", "reference", "passport", "birth certificate",
        "marriage certificate", "will", "insurance", "warranty", "social security",
        "drivers license",
    ]),
    ("Travel and Tourism", &[
        "travel", "itinerary", "flight", "hotel", "booking", "reservation", "passport",
        "visa", "tourism", "destination", "vacation", "cruise", "airbnb", "backpacking",
        "travel insurance", "customs", "immigration", "currency exchange", "sightseeing",
    ]),
    ("Food and Recipes", &[
        "recipe", "cooking", "ingredient", "meal", "cuisine", "baking", "nutrition",
        "calorie", "diet", "menu", "restaurant", "food safety", "allergen", "vegan",
        "vegetarian", "gluten free", "food preparation", "kitchen", "chef", "culinary",
    ]),
    ("Health and Fitness", &[
        "fitness", "exercise", "workout", "gym", "weight loss", "nutrition", "diet plan",
        "cardio", "strength training", "yoga", "pilates", "marathon", "running",
        "bodybuilding", "personal trainer", "bmi", "calories", "macros", "stretching",
        "recovery",
    ]),
    ("Sports", &[
        "sports", "football", "basketball", "soccer", "baseball", "tennis", "cricket",
        "golf", "swimming", "athletics", "olympics", "tournament", "championship",
        "league", "playoff", "score", "coach", "referee", "stadium", "athlete", "team",
    ]),
    ("Fashion and Textile", &[
        "fashion", "clothing", "apparel", "textile", "fabric", "designer", "collection",
        "runway", "trend", "pattern", "sewing", "garment", "boutique",
        "sustainable fashion", "accessories", "couture", "ready to wear", "fashion week",
    ]),
    // Creative & media
    ("Creative Writing", &[
        "story", "novel", "fiction", "poetry", "narrative", "character", "plot",
        "dialogue", "theme", "setting", "prose", "verse", "chapter", "manuscript",
        "draft", "creative", "literary", "short story", "memoir", "screenplay",
        "playwriting",
    ]),
    ("News Articles", &[
        "news", "article", "press release", "journalism", "reporter", "headline",
        "breaking news", "editorial", "opinion", "interview", "coverage", "media",
        "newspaper", "magazine", "broadcast", "wire service", "syndication", "byline",
        "dateline",
    ]),
    ("Music and Audio", &[
        "music", "song", "melody", "harmony", "rhythm", "chord", "composition",
        "orchestra", "band", "album", "track", "recording", "mixing", "mastering",
        "producer", "lyrics", "tempo", "key", "scale", "genre", "concert", "playlist",
    ]),
    ("Photography", &[
        "photography", "camera", "lens", "exposure", "aperture", "shutter", "iso",
        "raw", "lightroom", "photoshop", "composition", "portrait", "landscape",
        "macro", "flash", "tripod", "resolution", "megapixel", "focal length",
        "white balance",
    ]),
    ("Film and Video", &[
        "film", "video", "cinema", "director", "screenplay", "script", "editing",
        "cinematography", "production", "post production", "documentary", "animation",
        "vfx", "storyboard", "shot list", "premiere pro", "final cut",
        "davinci resolve", "color grading",
    ]),
    // Social sciences & humanities
    ("History", &[
        "history", "historical", "ancient", "medieval", "renaissance", "revolution",
        "civilization", "empire", "dynasty", "war", "archaeology", "artifact",
        "primary source", "chronicle", "era", "century", "colonialism", "independence",
        "treaty",
    ]),
    ("Philosophy", &[
        "philosophy", "ethics", "metaphysics", "epistemology", "logic",
        "existentialism", "utilitarianism", "phenomenology", "ontology", "morality",
        "virtue", "consciousness", "free will", "determinism", "socrates", "plato",
        "aristotle", "kant", "nietzsche",
    ]),
    ("Psychology", &[
        "psychology", "behavior", "cognition", "perception", "motivation", "emotion",
        "personality", "social psychology", "developmental", "neuroscience",
        "cognitive bias", "memory", "attention", "conditioning", "reinforcement",
        "psychoanalysis", "experiment",
    ]),
    ("Sociology", &[
        "sociology", "society", "social structure", "culture", "institution",
        "stratification", "inequality", "class", "race", "gender", "urbanization",
        "globalization", "social movement", "community", "deviance", "norm",
        "socialization", "demography",
    ]),
    ("Economics", &[
        "economics", "gdp", "inflation", "unemployment", "monetary policy",
        "fiscal policy", "supply demand", "microeconomics", "macroeconomics", "trade",
        "tariff", "recession", "economic growth", "interest rate", "federal reserve",
        "central bank", "consumer price index",
    ]),
    ("Political Science", &[
        "political", "politics", "democracy", "election", "voter", "campaign", "party",
        "ideology", "liberalism", "conservatism", "geopolitics", "diplomacy",
        "foreign policy", "international relations", "sovereignty", "republic",
        "authoritarian", "constitution",
    ]),
    ("Linguistics", &[
        "linguistics", "language", "grammar", "syntax", "semantics", "phonetics",
        "phonology", "morphology", "pragmatics", "dialect", "translation", "bilingual",
        "etymology", "lexicon", "corpus", "sociolinguistics", "psycholinguistics",
        "computational linguistics",
    ]),
    ("Anthropology", &[
        "anthropology", "culture", "ethnography", "fieldwork", "tribe", "kinship",
        "ritual", "artifact", "indigenous", "folklore", "cultural anthropology",
        "biological anthropology", "archaeology", "ethnology", "cross cultural",
        "human evolution",
    ]),
    ("Religious Studies", &[
        "religion", "theology", "spiritual", "faith", "scripture", "worship", "prayer",
        "church", "mosque", "temple", "synagogue", "bible", "quran", "torah",
        "buddhism", "hinduism", "islam", "christianity", "judaism", "meditation",
        "pilgrimage",
    ]),
    ("Geography", &[
        "geography", "map", "cartography", "gis", "topography", "latitude", "longitude",
        "continent", "country", "region", "urban", "rural", "population", "migration",
        "land use", "remote sensing", "spatial analysis", "terrain", "elevation",
    ]),
    // Agriculture & environment
    ("Agriculture", &[
        "agriculture", "farming", "crop", "harvest", "irrigation", "fertilizer",
        "pesticide", "soil", "livestock", "dairy", "organic farming",
        "sustainable agriculture", "agronomy", "horticulture", "aquaculture", "seed",
        "yield", "plantation", "greenhouse", "hydroponics", "agroforestry",
    ]),
    // Transportation & automotive
    ("Automotive", &[
        "automotive", "vehicle", "car", "engine", "transmission", "brake", "suspension",
        "emission", "fuel", "electric vehicle", "hybrid", "battery", "horsepower",
        "torque", "odometer", "maintenance", "recall", "warranty", "dealership", "vin",
    ]),
    ("Aviation", &[
        "aviation", "aircraft", "pilot", "flight", "airport", "runway",
        "air traffic control", "faa", "cockpit", "altitude", "airspace",
        "maintenance log", "flight plan", "navigation", "turbulence", "landing gear",
        "fuselage", "wing", "hangar",
    ]),
    ("Maritime", &[
        "maritime", "ship", "vessel", "port", "harbor", "cargo", "container",
        "navigation", "maritime law", "admiralty", "coast guard", "shipping lane",
        "tonnage", "dry dock", "anchor", "ballast", "buoy", "lighthouse",
    ]),
    // Energy & utilities
    ("Energy", &[
        "energy", "power plant", "electricity", "grid", "renewable", "solar panel",
        "wind turbine", "hydropower", "nuclear energy", "fossil fuel", "natural gas",
        "coal", "petroleum", "oil", "energy efficiency", "smart grid",
        "battery storage", "kilowatt", "megawatt", "utility", "transmission line",
    ]),
    // Nonprofit & social
    ("Nonprofit Documents", &[
        "nonprofit", "charity", "donation", "grant", "fundraising", "volunteer",
        "mission", "501c3", "foundation", "endowment", "philanthropy", "beneficiary",
        "outreach", "community service", "social impact", "annual report",
        "tax exempt", "board of directors",
    ]),
    // Communications & PR
    ("Public Relations", &[
        "public relations", "pr", "press release", "media relations", "spokesperson",
        "press conference", "crisis communication", "reputation management",
        "media kit", "press coverage", "brand image", "corporate communication",
        "stakeholder communication",
    ]),
    ("Corporate Communications", &[
        "memo", "internal communication", "newsletter", "announcement",
        "company update", "town hall", "all hands", "intranet",
        "employee communication", "organizational update", "bulletin", "circular",
        "notice", "policy update",
    ]),
    // Technical writing & documentation
    ("Technical Manuals", &[
        "manual", "guide", "documentation", "specification", "instruction",
        "user guide", "reference", "handbook", "procedure", "standard", "protocol",
        "operation", "maintenance", "troubleshooting", "installation",
        "api documentation", "release notes", "changelog", "readme",
    ]),
    ("Research Proposals", &[
        "proposal", "grant proposal", "research plan", "funding request",
        "budget justification", "specific aims", "methodology", "literature review",
        "timeline", "expected outcomes", "principal investigator", "co investigator",
        "nsf", "nih",
    ]),
    ("Reports", &[
        "report", "quarterly report", "annual report", "status report",
        "progress report", "incident report", "audit report", "feasibility study",
        "white paper", "case study", "benchmark", "executive summary", "findings",
        "recommendation", "analysis report",
    ]),
    ("Presentations", &[
        "presentation", "slide", "powerpoint", "keynote", "pitch deck", "slide deck",
        "talking points", "visual aid", "speaker notes", "conference presentation",
        "webinar", "demo", "showcase",
    ]),
    // Miscellaneous / general
    ("General Documents", &[
        "document", "file", "note", "record", "log", "form", "template", "checklist",
        "worksheet", "spreadsheet", "catalog", "directory", "index", "inventory",
        "register", "manifest",
    ]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryScore {
    pub score: u32,
    pub match_count: u32,
}

/// Compiled keyword automaton shared by the per-file pass and the
/// cluster-naming pass.
pub struct KeywordMatcher {
    automaton: AhoCorasick,
    pattern_category: Vec<usize>,
    category_count: usize,
    categories: &'static [(&'static str, &'static [&'static str])],
}

impl KeywordMatcher {
    pub fn new() -> Self {
        Self::from_categories(CATEGORIES)
    }

    pub fn from_categories(categories: &'static [(&'static str, &'static [&'static str])]) -> Self {
        let mut patterns: Vec<String> = Vec::new();
        let mut pattern_category = Vec::new();
        for (category_index, (_, keywords)) in categories.iter().enumerate() {
            for keyword in keywords.iter() {
                patterns.push(keyword.to_lowercase());
                pattern_category.push(category_index);
            }
        }
        let automaton = AhoCorasick::new(&patterns).unwrap();
        Self {
            automaton,
            pattern_category,
            category_count: categories.len(),
            categories,
        }
    }

    pub fn category_name(&self, index: usize) -> &'static str {
        self.categories[index].0
    }

    /// Count word-boundary hits per keyword pattern in a lowercase haystack.
    fn pattern_hits(&self, haystack: &str) -> Vec<u32> {
        let mut hits = vec![0u32; self.pattern_category.len()];
        let bytes = haystack.as_bytes();
        for m in self.automaton.find_overlapping_iter(haystack) {
            let before_ok = m.start() == 0 || !is_word_byte(bytes[m.start() - 1]);
            let after_ok = m.end() == bytes.len() || !is_word_byte(bytes[m.end()]);
            if before_ok && after_ok {
                hits[m.pattern().as_usize()] += 1;
            }
        }
        hits
    }

    /// Per-category scores for a pair of haystacks, with filename hits
    /// weighted by `file_weight`.
    fn category_scores(&self, text: &str, filenames: &str, file_weight: u32) -> Vec<CategoryScore> {
        let text_hits = self.pattern_hits(text);
        let file_hits = if filenames.is_empty() {
            vec![0u32; self.pattern_category.len()]
        } else {
            self.pattern_hits(filenames)
        };

        let mut scores = vec![CategoryScore::default(); self.category_count];
        for (pattern, category) in self.pattern_category.iter().enumerate() {
            let t = text_hits[pattern];
            let f = file_hits[pattern];
            if t > 0 || f > 0 {
                let entry = &mut scores[*category];
                entry.match_count += 1;
                entry.score += t + f * file_weight;
            }
        }
        scores
    }

    /// Per-file category detection: text and filename are one uniform
    /// haystack. Highest score wins, then highest match count, then
    /// dictionary order. `None` below the threshold.
    pub fn best_file_category(&self, text: &str, filename: &str, min_score: u32) -> Option<&'static str> {
        let combined = format!("{} {}", text.to_lowercase(), filename.to_lowercase());
        let scores = self.category_scores(&combined, "", 1);
        self.pick_best(&scores, min_score)
    }

    /// Post-hoc cluster naming: filename hits are a strong signal and count
    /// triple.
    pub fn best_cluster_category(
        &self,
        texts: &[&str],
        file_names: &[&str],
        min_score: u32,
    ) -> Option<&'static str> {
        let combined_text = texts.join(" ").to_lowercase();
        let combined_files = file_names.join(" ").to_lowercase();
        let scores = self.category_scores(&combined_text, &combined_files, 3);
        self.pick_best(&scores, min_score)
    }

    fn pick_best(&self, scores: &[CategoryScore], min_score: u32) -> Option<&'static str> {
        let mut best: Option<(usize, CategoryScore)> = None;
        for (index, entry) in scores.iter().enumerate() {
            if entry.match_count < 1 {
                continue;
            }
            let better = match &best {
                None => true,
                Some((_, b)) => {
                    (entry.score, entry.match_count) > (b.score, b.match_count)
                }
            };
            if better {
                best = Some((index, *entry));
            }
        }
        match best {
            Some((index, entry)) if entry.score >= min_score => Some(self.category_name(index)),
            _ => None,
        }
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}
